//! Consolidation engine for knowledgepack.
//!
//! Takes classified fragments plus isolated framework records and produces a
//! bounded set of consolidated documents per output category. The crate is
//! pure: no filesystem or network access, no shared mutable state.

pub mod consolidator;
pub mod dedup;
pub mod frameworks;
pub mod grouper;
pub mod merge;
pub mod naming;
pub mod optimizer;
pub mod tracker;

pub use consolidator::{
    Consolidation, ConsolidationReport, Consolidator, ProgressReporter, SilentProgress,
};
pub use dedup::{DedupOutcome, DedupStats, remove_exact_duplicates};
pub use merge::{MergeContext, MergeStrategy, strategy_for};
pub use optimizer::OptimizationReport;
pub use tracker::{ContentTracker, PreservationReport};
