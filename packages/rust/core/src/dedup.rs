//! Exact-duplicate removal.
//!
//! Two-stage check: a SHA-256 over whitespace-normalized text finds candidate
//! duplicates, then a position-aligned character similarity confirms them.
//! Hash matches that fall under the threshold are kept.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use knowledgepack_shared::{Fragment, FragmentId};

/// Counters produced by one dedup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    /// Fragments looked at.
    pub examined: usize,
    /// Fragments dropped as duplicates.
    pub removed: usize,
    /// Hash matches that scored under the threshold and were kept.
    pub collisions_kept: usize,
}

/// Result of [`remove_exact_duplicates`].
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome<'a> {
    /// Surviving fragments, in first-seen order.
    pub kept: Vec<&'a Fragment>,
    /// Ids of the dropped fragments.
    pub removed: Vec<FragmentId>,
    /// Surviving fragment id → number of duplicates dropped in its favor.
    pub duplicates_of: HashMap<FragmentId, usize>,
    pub stats: DedupStats,
}

/// Remove true duplicates, preserving first-seen order.
#[instrument(skip_all, fields(fragments = fragments.len(), threshold))]
pub fn remove_exact_duplicates<'a>(fragments: &[&'a Fragment], threshold: f64) -> DedupOutcome<'a> {
    let mut seen: HashMap<String, &'a Fragment> = HashMap::new();
    let mut outcome = DedupOutcome {
        kept: Vec::with_capacity(fragments.len()),
        ..DedupOutcome::default()
    };

    for &fragment in fragments {
        outcome.stats.examined += 1;
        let hash = content_hash(fragment.text());

        let Some(&existing) = seen.get(&hash) else {
            seen.insert(hash, fragment);
            outcome.kept.push(fragment);
            continue;
        };

        if similarity(fragment.text(), existing.text()) < threshold {
            outcome.stats.collisions_kept += 1;
            outcome.kept.push(fragment);
            continue;
        }

        debug!(
            removed = %fragment.id(),
            original = %existing.id(),
            "removed duplicate fragment"
        );
        outcome.stats.removed += 1;
        outcome.removed.push(fragment.id().clone());
        *outcome
            .duplicates_of
            .entry(existing.id().clone())
            .or_default() += 1;
    }

    info!(
        examined = outcome.stats.examined,
        removed = outcome.stats.removed,
        collisions_kept = outcome.stats.collisions_kept,
        "duplicate removal complete"
    );

    outcome
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex SHA-256 of the whitespace-normalized text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_whitespace(text).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Character-position-aligned equality ratio over the longer normalized text.
///
/// Both sides are whitespace-normalized and lower-cased first. An empty side
/// scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_whitespace(a).to_lowercase();
    let b = normalize_whitespace(b).to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let common = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    let longest = a.chars().count().max(b.chars().count());
    common as f64 / longest as f64
}
