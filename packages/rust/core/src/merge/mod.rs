//! Per-category merge strategies.
//!
//! Each [`Category`] maps to exactly one [`MergeStrategy`] through
//! [`strategy_for`]; adding a category means adding one arm there. Every
//! strategy receives its fragments already ordered by (source, position) and
//! emits documents through [`build_document`].

mod concepts;
mod guides;
mod templates;
mod transcripts;

use std::collections::HashMap;

use knowledgepack_shared::{
    Category, ConsolidatedDocument, ConsolidationConfig, Fragment, FragmentId, OutputCategory,
    TokenCounter,
};

use crate::naming;

pub use concepts::ConceptsMerger;
pub use guides::{FrameworkNotesMerger, GuideMerger};
pub use templates::TemplateMerger;
pub use transcripts::TranscriptMerger;

/// Fixed vocabulary matched against document text for keywords.
const KEYWORD_VOCABULARY: [&str; 15] = [
    "framework", "system", "method", "strategy", "tactic",
    "client", "customer", "business", "offer", "service",
    "leverage", "scale", "growth", "revenue", "profit",
];

/// Upper bound on keywords per document.
pub const MAX_KEYWORDS: usize = 10;

/// Everything a strategy needs besides its fragments.
pub struct MergeContext<'a> {
    pub config: &'a ConsolidationConfig,
    pub counter: &'a dyn TokenCounter,
    /// Surviving fragment id → duplicates removed in its favor.
    pub duplicates: &'a HashMap<FragmentId, usize>,
}

/// Turns one category's ordered fragments into documents.
pub trait MergeStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Bucket the produced documents belong to.
    fn output(&self) -> OutputCategory;

    fn merge(&self, fragments: &[&Fragment], ctx: &MergeContext<'_>) -> Vec<ConsolidatedDocument>;
}

/// The single registration point from category to strategy.
pub fn strategy_for(category: Category) -> &'static dyn MergeStrategy {
    match category {
        Category::Book => &ConceptsMerger,
        Category::Transcript => &TranscriptMerger,
        Category::Template | Category::Email => &TemplateMerger,
        Category::Guide => &GuideMerger,
        Category::Framework => &FrameworkNotesMerger,
    }
}

// ---------------------------------------------------------------------------
// Accumulator state machine
// ---------------------------------------------------------------------------

/// Running document state shared by the greedy mergers.
///
/// Transitions are [`Accumulator::append`] and [`Accumulator::flush`]; callers
/// flush whatever remains once input ends.
#[derive(Debug)]
pub(crate) struct Accumulator<'a> {
    fragments: Vec<&'a Fragment>,
    tokens: usize,
    key: Option<String>,
}

impl<'a> Accumulator<'a> {
    pub(crate) fn new() -> Self {
        Self {
            fragments: Vec::new(),
            tokens: 0,
            key: None,
        }
    }

    pub(crate) fn append(&mut self, fragment: &'a Fragment, key: Option<&str>) {
        self.tokens += fragment.tokens();
        self.fragments.push(fragment);
        if let Some(key) = key {
            self.key = Some(key.to_string());
        }
    }

    /// Take the accumulated fragments and reset the running count.
    ///
    /// The grouping key survives the flush so the next fragment can be
    /// compared against it.
    pub(crate) fn flush(&mut self) -> Vec<&'a Fragment> {
        self.tokens = 0;
        std::mem::take(&mut self.fragments)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub(crate) fn tokens(&self) -> usize {
        self.tokens
    }

    pub(crate) fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Whether appending `fragment` would push the running count past `max`.
    pub(crate) fn would_exceed(&self, fragment: &Fragment, max: usize) -> bool {
        self.tokens + fragment.tokens() > max
    }
}

/// Greedy fill in original order: a part closes when the next fragment would
/// exceed `max`. A single oversized fragment still forms its own part.
pub(crate) fn fill_parts<'a>(fragments: &[&'a Fragment], max: usize) -> Vec<Vec<&'a Fragment>> {
    let mut parts = Vec::new();
    let mut acc = Accumulator::new();

    for &fragment in fragments {
        if !acc.is_empty() && acc.would_exceed(fragment, max) {
            parts.push(acc.flush());
        }
        acc.append(fragment, None);
    }
    if !acc.is_empty() {
        parts.push(acc.flush());
    }

    parts
}

/// Split a slice already ordered by source into per-source runs.
pub(crate) fn by_source<'a, 'b>(fragments: &'b [&'a Fragment]) -> impl Iterator<Item = &'b [&'a Fragment]> {
    fragments.chunk_by(|a, b| a.source() == b.source())
}

// ---------------------------------------------------------------------------
// Shared document builder
// ---------------------------------------------------------------------------

/// Build a document from fragments in the given order.
///
/// Texts are joined with a blank line and the token length is measured over
/// the joined text.
pub fn build_document(
    ctx: &MergeContext<'_>,
    category: OutputCategory,
    title: &str,
    fragments: &[&Fragment],
    index: usize,
) -> ConsolidatedDocument {
    let content = fragments
        .iter()
        .map(|f| f.text())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut source_files: Vec<String> = fragments.iter().map(|f| f.source().to_string()).collect();
    source_files.sort();
    source_files.dedup();

    let duplicate_count: usize = fragments
        .iter()
        .filter_map(|f| ctx.duplicates.get(f.id()))
        .sum();

    ConsolidatedDocument {
        filename: naming::document_filename(index, title),
        title: title.to_string(),
        category,
        total_tokens: ctx.counter.count(&content),
        keywords: extract_keywords(&content),
        content,
        source_fragments: fragments.iter().map(|f| f.id().clone()).collect(),
        source_files,
        has_duplicates_removed: duplicate_count > 0,
        duplicate_count,
    }
}

/// Vocabulary terms present in the lower-cased content, sorted, at most 10.
pub fn extract_keywords(content: &str) -> Vec<String> {
    let lower = content.to_lowercase();
    let mut keywords: Vec<String> = KEYWORD_VOCABULARY
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| (*term).to_string())
        .collect();
    keywords.sort();
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use knowledgepack_shared::WordEstimate;

    pub(crate) struct Fixture {
        pub config: ConsolidationConfig,
        pub counter: WordEstimate,
        pub duplicates: HashMap<FragmentId, usize>,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            Self {
                config: ConsolidationConfig::default(),
                counter: WordEstimate::default(),
                duplicates: HashMap::new(),
            }
        }

        pub(crate) fn ctx(&self) -> MergeContext<'_> {
            MergeContext {
                config: &self.config,
                counter: &self.counter,
                duplicates: &self.duplicates,
            }
        }
    }
}
