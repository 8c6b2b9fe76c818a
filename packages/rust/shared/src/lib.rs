//! Shared types, error model, and configuration for knowledgepack.
//!
//! This crate is the foundation depended on by all other knowledgepack crates.
//! It provides:
//! - [`KnowledgePackError`]: the unified error type
//! - Domain types ([`Fragment`], [`Framework`], [`ConsolidatedDocument`], [`Category`])
//! - Configuration ([`AppConfig`], [`ConsolidationConfig`], config loading)
//! - Token measurement ([`TokenCounter`], [`WordEstimate`])

pub mod config;
pub mod error;
pub mod tokens;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConsolidationConfig, FrameworkEntry, IsolationConfig, OutputConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{KnowledgePackError, Result};
pub use tokens::{TokenCounter, WordEstimate};
pub use types::{
    Category, ConsolidatedDocument, Fragment, FragmentId, Framework, FrameworkComponent,
    OutputCategory,
};
