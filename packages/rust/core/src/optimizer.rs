//! File-count optimization.
//!
//! When the run produces too many documents, small documents inside the same
//! output category are paired up until a pass finds nothing left to merge.
//! Framework documents are never merged.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use knowledgepack_shared::{ConsolidatedDocument, ConsolidationConfig, OutputCategory, TokenCounter};

use crate::merge::MAX_KEYWORDS;

/// Separator placed between two merged documents.
const MERGE_SEPARATOR: &str = "\n\n---\n\n";

/// What the optimizer did to the document set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationReport {
    pub documents_before: usize,
    pub documents_after: usize,
    /// Whether the count exceeded the merge trigger (target × 1.2).
    pub triggered: bool,
    /// Passes run, including the final pass that merged nothing.
    pub passes: usize,
    /// Pairs merged across all passes.
    pub merges: usize,
    pub warnings: Vec<String>,
}

/// Bring the document count toward `config.target_file_count`.
#[instrument(skip_all, fields(target = config.target_file_count))]
pub fn optimize(
    documents: &mut BTreeMap<OutputCategory, Vec<ConsolidatedDocument>>,
    config: &ConsolidationConfig,
    counter: &dyn TokenCounter,
) -> OptimizationReport {
    let target = config.target_file_count;
    let before = total(documents);
    let mut report = OptimizationReport {
        documents_before: before,
        ..OptimizationReport::default()
    };

    // integer form of `before > target * 1.2`
    if before.saturating_mul(10) > target.saturating_mul(12) {
        report.triggered = true;
        loop {
            report.passes += 1;
            let mut merged = 0;
            for (category, docs) in documents.iter_mut() {
                if *category == OutputCategory::Frameworks {
                    continue;
                }
                let (next, count) = merge_small_documents(std::mem::take(docs), config, counter);
                *docs = next;
                merged += count;
            }
            debug!(pass = report.passes, merged, "small-document pass");
            report.merges += merged;
            if merged == 0 {
                break;
            }
        }
    } else if before.saturating_mul(2) < target {
        let message = format!("only {before} documents produced, under half the target of {target}");
        warn!("{message}");
        report.warnings.push(message);
    }

    report.documents_after = total(documents);
    info!(
        before = report.documents_before,
        after = report.documents_after,
        merges = report.merges,
        "file-count optimization complete"
    );
    report
}

/// One pass over a single category.
///
/// Documents are sorted by ascending tokens and adjacent pairs are merged when
/// both sit under the floor and their sum stays within the ceiling. Returns
/// the new list and the number of merges.
pub fn merge_small_documents(
    mut docs: Vec<ConsolidatedDocument>,
    config: &ConsolidationConfig,
    counter: &dyn TokenCounter,
) -> (Vec<ConsolidatedDocument>, usize) {
    docs.sort_by_key(|d| d.total_tokens);

    let mut out = Vec::with_capacity(docs.len());
    let mut merges = 0;
    let mut iter = docs.into_iter().peekable();

    while let Some(first) = iter.next() {
        if first.total_tokens >= config.min_tokens {
            out.push(first);
            continue;
        }

        let partner = iter.next_if(|second| {
            second.total_tokens < config.min_tokens
                && first.total_tokens + second.total_tokens <= config.max_tokens
        });

        match partner {
            Some(second) => {
                merges += 1;
                out.push(merge_pair(first, second, counter));
            }
            None => out.push(first),
        }
    }

    (out, merges)
}

fn merge_pair(
    first: ConsolidatedDocument,
    second: ConsolidatedDocument,
    counter: &dyn TokenCounter,
) -> ConsolidatedDocument {
    let content = format!("{}{MERGE_SEPARATOR}{}", first.content, second.content);

    let mut source_files = first.source_files;
    source_files.extend(second.source_files);
    source_files.sort();
    source_files.dedup();

    let mut keywords = first.keywords;
    keywords.extend(second.keywords);
    keywords.sort();
    keywords.dedup();
    keywords.truncate(MAX_KEYWORDS);

    let mut source_fragments = first.source_fragments;
    source_fragments.extend(second.source_fragments);

    let duplicate_count = first.duplicate_count + second.duplicate_count;

    ConsolidatedDocument {
        filename: first.filename,
        title: format!("{} & {}", first.title, second.title),
        category: first.category,
        total_tokens: counter.count(&content),
        content,
        source_fragments,
        source_files,
        keywords,
        has_duplicates_removed: duplicate_count > 0,
        duplicate_count,
    }
}

fn total(documents: &BTreeMap<OutputCategory, Vec<ConsolidatedDocument>>) -> usize {
    documents.values().map(Vec::len).sum()
}
