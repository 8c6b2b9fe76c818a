//! End-to-end consolidation run.
//!
//! Stages, in order:
//!
//! 1. Input validation and content tracking
//! 2. Exact-duplicate removal
//! 3. Grouping by category
//! 4. Framework documents, then per-category merge strategies
//! 5. File-count optimization
//! 6. Preservation verification
//!
//! Every stage returns its own stats, composed into [`ConsolidationReport`].

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use knowledgepack_shared::{
    Category, ConsolidatedDocument, ConsolidationConfig, Fragment, FragmentId, Framework,
    KnowledgePackError, OutputCategory, Result, TokenCounter,
};

use crate::dedup::{DedupStats, remove_exact_duplicates};
use crate::frameworks::build_framework_documents;
use crate::grouper::group_by_category;
use crate::merge::{MergeContext, MergeStrategy, strategy_for};
use crate::optimizer::{OptimizationReport, optimize};
use crate::tracker::{ContentTracker, PreservationReport};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Callback trait for reporting consolidation progress.
pub trait ProgressReporter {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called after a strategy has produced its documents.
    fn category_merged(&self, category: OutputCategory, documents: usize);
    /// Called when the run completes.
    fn done(&self, report: &ConsolidationReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn category_merged(&self, _category: OutputCategory, _documents: usize) {}
    fn done(&self, _report: &ConsolidationReport) {}
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct Consolidation {
    /// All five output categories, possibly empty.
    pub documents: BTreeMap<OutputCategory, Vec<ConsolidatedDocument>>,
    pub report: ConsolidationReport,
}

impl Consolidation {
    pub fn total_documents(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }
}

/// Run statistics and warnings.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationReport {
    pub input_fragments: usize,
    /// Fragments held back because a framework already captured them.
    pub excluded_framework_fragments: usize,
    pub dedup: DedupStats,
    pub removed_fragments: Vec<FragmentId>,
    pub framework_documents: usize,
    pub documents_by_category: BTreeMap<OutputCategory, usize>,
    pub total_documents: usize,
    pub total_tokens: usize,
    pub optimization: OptimizationReport,
    pub preservation: PreservationReport,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Consolidator
// ---------------------------------------------------------------------------

/// Merges fragments into a bounded set of upload-ready documents.
#[derive(Debug, Clone)]
pub struct Consolidator<C> {
    config: ConsolidationConfig,
    counter: C,
}

impl<C: TokenCounter> Consolidator<C> {
    /// Validate `config` and build a consolidator around `counter`.
    pub fn new(config: ConsolidationConfig, counter: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, counter })
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Run every stage over a fully materialized fragment sequence.
    #[instrument(skip_all, fields(fragments = fragments.len(), frameworks = frameworks.len()))]
    pub fn consolidate(
        &self,
        fragments: &[Fragment],
        frameworks: &BTreeMap<String, Framework>,
        progress: &dyn ProgressReporter,
    ) -> Result<Consolidation> {
        let start = Instant::now();
        validate_input(fragments, frameworks)?;
        info!(
            fragments = fragments.len(),
            frameworks = frameworks.len(),
            "starting consolidation"
        );

        let mut tracker = ContentTracker::track_input(fragments);
        let all: Vec<&Fragment> = fragments.iter().collect();

        // --- Stage 1: framework exclusion ---
        // Captured framework-category fragments always live in their framework
        // document only; other captured fragments are held back on request.
        let captured: HashSet<&FragmentId> = frameworks
            .values()
            .flat_map(|fw| fw.source_fragments.iter())
            .collect();
        let exclude_all = self.config.exclude_framework_fragments;
        let candidates: Vec<&Fragment> = all
            .iter()
            .copied()
            .filter(|f| {
                let held = exclude_all || f.category() == Category::Framework;
                !(held && captured.contains(f.id()))
            })
            .collect();
        let excluded = all.len() - candidates.len();
        if excluded > 0 {
            debug!(excluded, "held back framework-captured fragments");
        }

        // --- Stage 2: dedup ---
        progress.phase("Removing duplicates");
        let dedup = remove_exact_duplicates(&candidates, self.config.dedup_threshold);

        // --- Stage 3: grouping ---
        progress.phase("Grouping fragments");
        let grouped = group_by_category(&dedup.kept);

        // --- Stage 4: frameworks, then strategies ---
        progress.phase("Merging categories");
        let mut documents: BTreeMap<OutputCategory, Vec<ConsolidatedDocument>> =
            OutputCategory::ALL.iter().map(|c| (*c, Vec::new())).collect();

        let framework_docs = build_framework_documents(frameworks, &all, &self.counter);
        let framework_documents = framework_docs.len();
        documents
            .entry(OutputCategory::Frameworks)
            .or_default()
            .extend(framework_docs);
        progress.category_merged(OutputCategory::Frameworks, framework_documents);

        let ctx = MergeContext {
            config: &self.config,
            counter: &self.counter,
            duplicates: &dedup.duplicates_of,
        };

        for (strategy, batch) in batches(grouped) {
            let docs = strategy.merge(&batch, &ctx);
            debug!(
                strategy = strategy.name(),
                fragments = batch.len(),
                documents = docs.len(),
                "category merged"
            );
            progress.category_merged(strategy.output(), docs.len());
            documents.entry(strategy.output()).or_default().extend(docs);
        }

        // --- Stage 5: file-count optimization ---
        progress.phase("Optimizing file count");
        let optimization = optimize(&mut documents, &self.config, &self.counter);

        // --- Stage 6: preservation ---
        progress.phase("Verifying preservation");
        let preservation = tracker.verify(&documents);

        let mut warnings = optimization.warnings.clone();
        warnings.extend(preservation.warning.clone());

        let documents_by_category: BTreeMap<OutputCategory, usize> =
            documents.iter().map(|(c, d)| (*c, d.len())).collect();
        let total_documents: usize = documents_by_category.values().sum();
        let total_tokens: usize = documents.values().flatten().map(|d| d.total_tokens).sum();

        let report = ConsolidationReport {
            input_fragments: fragments.len(),
            excluded_framework_fragments: excluded,
            dedup: dedup.stats.clone(),
            removed_fragments: dedup.removed.clone(),
            framework_documents,
            documents_by_category,
            total_documents,
            total_tokens,
            optimization,
            preservation,
            warnings,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            documents = report.total_documents,
            tokens = report.total_tokens,
            duplicates = report.dedup.removed,
            warnings = report.warnings.len(),
            "consolidation complete"
        );
        progress.done(&report);

        Ok(Consolidation { documents, report })
    }
}

/// Pair each group with its strategy, concatenating groups that share one
/// (templates then emails).
fn batches<'a>(
    grouped: BTreeMap<Category, Vec<&'a Fragment>>,
) -> Vec<(&'static dyn MergeStrategy, Vec<&'a Fragment>)> {
    let mut out: Vec<(&'static dyn MergeStrategy, Vec<&'a Fragment>)> = Vec::new();

    for (category, group) in grouped {
        let strategy = strategy_for(category);
        match out.iter_mut().find(|(s, _)| s.name() == strategy.name()) {
            Some((_, batch)) => batch.extend(group),
            None => out.push((strategy, group)),
        }
    }

    out
}

fn validate_input(fragments: &[Fragment], frameworks: &BTreeMap<String, Framework>) -> Result<()> {
    if fragments.is_empty() {
        return Err(KnowledgePackError::EmptyInput(
            "no fragments to consolidate".into(),
        ));
    }
    if let Some(bad) = fragments.iter().find(|f| f.source().trim().is_empty()) {
        return Err(KnowledgePackError::validation(format!(
            "fragment {} has a blank source name",
            bad.id()
        )));
    }
    if frameworks.values().any(|fw| fw.name.trim().is_empty()) {
        return Err(KnowledgePackError::validation("framework with a blank name"));
    }
    Ok(())
}
