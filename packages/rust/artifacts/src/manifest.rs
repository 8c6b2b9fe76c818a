//! Upload manifest and provenance map schemas.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use knowledgepack_shared::{FragmentId, OutputCategory};

/// `for_upload/upload_manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadManifest {
    pub generated: DateTime<Utc>,
    /// Tool name and version that produced the output.
    pub generator: String,
    pub statistics: ManifestStatistics,
    /// Non-empty categories only.
    pub categories: BTreeMap<OutputCategory, CategoryEntry>,
    /// Suggested upload order, highest priority first.
    pub upload_order: Vec<OutputCategory>,
}

/// Totals across all categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestStatistics {
    pub total_files: usize,
    pub total_tokens: usize,
    pub average_tokens_per_file: usize,
    pub files_by_category: BTreeMap<OutputCategory, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub file_count: usize,
    pub total_tokens: usize,
    pub files: Vec<EmittedFile>,
}

/// One emitted document file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmittedFile {
    /// Renumbered filename inside the category folder.
    pub filename: String,
    pub title: String,
    pub tokens: usize,
    /// First five keywords.
    pub keywords: Vec<String>,
    /// Number of contributing fragments.
    pub source_count: usize,
    /// SHA-256 of the written file, header included.
    pub sha256: String,
    pub size_bytes: usize,
}

/// One row of `processing/consolidated_map.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub filename: String,
    pub title: String,
    pub source_fragments: Vec<FragmentId>,
    pub source_files: Vec<String>,
    pub token_count: usize,
}

impl CategoryEntry {
    pub(crate) fn new(files: Vec<EmittedFile>) -> Self {
        Self {
            file_count: files.len(),
            total_tokens: files.iter().map(|f| f.tokens).sum(),
            files,
        }
    }
}

impl UploadManifest {
    pub(crate) fn new(
        generated: DateTime<Utc>,
        tool_version: &str,
        categories: BTreeMap<OutputCategory, CategoryEntry>,
    ) -> Self {
        let total_files: usize = categories.values().map(|c| c.file_count).sum();
        let total_tokens: usize = categories.values().map(|c| c.total_tokens).sum();
        let files_by_category = categories
            .iter()
            .map(|(category, entry)| (*category, entry.file_count))
            .collect();

        Self {
            generated,
            generator: format!("knowledgepack {tool_version}"),
            statistics: ManifestStatistics {
                total_files,
                total_tokens,
                average_tokens_per_file: total_tokens.checked_div(total_files).unwrap_or(0),
                files_by_category,
            },
            categories,
            upload_order: OutputCategory::ALL.to_vec(),
        }
    }
}
