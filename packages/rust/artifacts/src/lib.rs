//! Output emission for consolidated documents.
//!
//! Takes a finished [`Consolidation`] and writes the upload-ready directory:
//!
//! ```text
//! <output_root>/
//! ├── for_upload/
//! │   ├── upload_manifest.json
//! │   ├── frameworks/01_3_Es_Framework_Complete.md
//! │   ├── core_concepts/...
//! │   ├── transcripts/...
//! │   ├── templates/...
//! │   └── guides/...
//! ├── processing/
//! │   └── consolidated_map.json
//! └── reports/
//!     └── consolidation_report.json
//! ```

mod manifest;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use knowledgepack_core::Consolidation;
use knowledgepack_shared::{ConsolidatedDocument, KnowledgePackError, OutputCategory, Result};

pub use manifest::{CategoryEntry, EmittedFile, ManifestStatistics, MapEntry, UploadManifest};

/// Directory holding the upload-ready category folders.
pub const UPLOAD_DIR: &str = "for_upload";
/// Directory holding provenance metadata.
pub const PROCESSING_DIR: &str = "processing";
/// Directory holding run reports.
pub const REPORTS_DIR: &str = "reports";

const MANIFEST_FILE: &str = "upload_manifest.json";
const MAP_FILE: &str = "consolidated_map.json";
const REPORT_FILE: &str = "consolidation_report.json";

/// Source names listed in a file header.
const HEADER_SOURCE_LIMIT: usize = 5;

/// Configuration for one emission run.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Root directory for all emitted output.
    pub output_root: PathBuf,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

/// Output from a successful emission.
#[derive(Debug, Clone)]
pub struct EmitResult {
    pub output_root: PathBuf,
    /// The manifest that was written.
    pub manifest: UploadManifest,
}

impl EmitResult {
    pub fn file_count(&self) -> usize {
        self.manifest.statistics.total_files
    }
}

/// Write every document, the upload manifest, the provenance map and the
/// run report.
///
/// Files are renumbered `01..` per category in emission order.
#[instrument(skip_all, fields(root = %config.output_root.display(), documents = consolidation.total_documents()))]
pub fn emit(config: &EmitConfig, consolidation: &Consolidation) -> Result<EmitResult> {
    let root = &config.output_root;
    create_dirs(root)?;

    let generated = Utc::now();
    let mut categories = BTreeMap::new();
    let mut map = BTreeMap::new();

    for category in OutputCategory::ALL {
        let docs = consolidation
            .documents
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut files = Vec::with_capacity(docs.len());
        let mut entries = Vec::with_capacity(docs.len());

        for (index, doc) in docs.iter().enumerate() {
            let filename = renumber(index, &doc.filename);
            let content = format_document(doc, generated);
            let path = root.join(UPLOAD_DIR).join(category.as_str()).join(&filename);
            write_atomic(&path, &content)?;

            debug!(file = %filename, %category, tokens = doc.total_tokens, "wrote document");

            files.push(EmittedFile {
                filename: filename.clone(),
                title: doc.title.clone(),
                tokens: doc.total_tokens,
                keywords: doc.keywords.iter().take(5).cloned().collect(),
                source_count: doc.source_fragments.len(),
                sha256: sha256_hex(&content),
                size_bytes: content.len(),
            });
            entries.push(MapEntry {
                filename,
                title: doc.title.clone(),
                source_fragments: doc.source_fragments.clone(),
                source_files: doc.source_files.clone(),
                token_count: doc.total_tokens,
            });
        }

        map.insert(category, entries);
        if !files.is_empty() {
            categories.insert(category, CategoryEntry::new(files));
        }
    }

    let manifest = UploadManifest::new(generated, &config.tool_version, categories);
    write_json(&root.join(UPLOAD_DIR).join(MANIFEST_FILE), &manifest)?;
    write_json(&root.join(PROCESSING_DIR).join(MAP_FILE), &map)?;
    write_json(&root.join(REPORTS_DIR).join(REPORT_FILE), &consolidation.report)?;

    info!(
        files = manifest.statistics.total_files,
        tokens = manifest.statistics.total_tokens,
        path = %root.display(),
        "emission complete"
    );

    Ok(EmitResult {
        output_root: root.clone(),
        manifest,
    })
}

/// Verify that an output directory matches its manifest.
///
/// Every listed file must exist and hash to the recorded checksum.
pub fn validate_output(root: &Path) -> Result<UploadManifest> {
    let manifest_path = root.join(UPLOAD_DIR).join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(KnowledgePackError::validation(format!(
            "missing {MANIFEST_FILE} in {}",
            root.display()
        )));
    }

    let raw = std::fs::read_to_string(&manifest_path)
        .map_err(|e| KnowledgePackError::io(&manifest_path, e))?;
    let manifest: UploadManifest = serde_json::from_str(&raw)
        .map_err(|e| KnowledgePackError::parse(format!("invalid {MANIFEST_FILE}: {e}")))?;

    for (category, entry) in &manifest.categories {
        for file in &entry.files {
            let path = root.join(UPLOAD_DIR).join(category.as_str()).join(&file.filename);
            let content = std::fs::read_to_string(&path).map_err(|e| KnowledgePackError::io(&path, e))?;
            if sha256_hex(&content) != file.sha256 {
                return Err(KnowledgePackError::validation(format!(
                    "checksum mismatch for {}",
                    path.display()
                )));
            }
        }
    }

    debug!(path = %root.display(), "output directory validated");
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `NN_` prefix replaced with the position in the emitted category.
pub fn renumber(index: usize, filename: &str) -> String {
    let rest = filename
        .split_once('_')
        .map_or(filename, |(_, rest)| rest);
    format!("{:02}_{rest}", index + 1)
}

/// Metadata header, a title heading, then the document content.
pub fn format_document(doc: &ConsolidatedDocument, generated: DateTime<Utc>) -> String {
    let sources = doc
        .source_files
        .iter()
        .take(HEADER_SOURCE_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "---\n\
         title: {title}\n\
         type: {category}\n\
         source_files: {sources}\n\
         keywords: {keywords}\n\
         token_count: {tokens}\n\
         duplicates_removed: {dups}\n\
         generated: {generated}\n\
         ---\n\
         \n\
         # {title}\n\
         \n\
         {content}",
        title = doc.title,
        category = doc.category,
        keywords = doc.keywords.join(", "),
        tokens = doc.total_tokens,
        dups = if doc.has_duplicates_removed { doc.duplicate_count } else { 0 },
        generated = generated.to_rfc3339(),
        content = doc.content,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn create_dirs(root: &Path) -> Result<()> {
    let mut dirs = vec![root.join(PROCESSING_DIR), root.join(REPORTS_DIR)];
    dirs.extend(
        OutputCategory::ALL
            .iter()
            .map(|c| root.join(UPLOAD_DIR).join(c.as_str())),
    );

    for dir in &dirs {
        std::fs::create_dir_all(dir).map_err(|e| KnowledgePackError::io(dir, e))?;
    }

    debug!(path = %root.display(), "directory structure created");
    Ok(())
}

/// Write to a dot-prefixed temp file beside `path`, then rename over it.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| KnowledgePackError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| KnowledgePackError::io(path, e))?;
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| KnowledgePackError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, &json)?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
