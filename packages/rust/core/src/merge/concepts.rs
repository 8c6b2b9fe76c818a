//! Book fragments → core concept documents, grouped by chapter.

use tracing::debug;

use knowledgepack_shared::{ConsolidatedDocument, Fragment, OutputCategory};

use super::{Accumulator, MergeContext, MergeStrategy, build_document};

/// Label used for fragments without a chapter.
const DEFAULT_CHAPTER: &str = "General";

/// Chapter-aware greedy merger for book content.
///
/// A new document starts when the chapter changes and the running document
/// has reached the token floor, or when the next fragment would push it past
/// the ceiling.
pub struct ConceptsMerger;

impl MergeStrategy for ConceptsMerger {
    fn name(&self) -> &'static str {
        "concepts"
    }

    fn output(&self) -> OutputCategory {
        OutputCategory::CoreConcepts
    }

    fn merge(&self, fragments: &[&Fragment], ctx: &MergeContext<'_>) -> Vec<ConsolidatedDocument> {
        let mut docs = Vec::new();
        let mut acc = Accumulator::new();

        for &fragment in fragments {
            let chapter = fragment.chapter().unwrap_or(DEFAULT_CHAPTER);

            if !acc.is_empty() {
                let chapter_break =
                    acc.key() != Some(chapter) && acc.tokens() >= ctx.config.min_tokens;
                let overflow = acc.would_exceed(fragment, ctx.config.max_tokens);

                if chapter_break || overflow {
                    debug!(chapter_break, overflow, tokens = acc.tokens(), "closing concepts document");
                    docs.push(self.flush(&mut acc, ctx, docs.len()));
                }
            }

            acc.append(fragment, Some(chapter));
        }

        if !acc.is_empty() {
            docs.push(self.flush(&mut acc, ctx, docs.len()));
        }

        docs
    }
}

impl ConceptsMerger {
    fn flush(
        &self,
        acc: &mut Accumulator<'_>,
        ctx: &MergeContext<'_>,
        index: usize,
    ) -> ConsolidatedDocument {
        let title = format!(
            "Core Concepts - {}",
            acc.key().unwrap_or(DEFAULT_CHAPTER)
        );
        let fragments = acc.flush();
        build_document(ctx, self.output(), &title, &fragments, index)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use knowledgepack_shared::Category;

    fn book(position: usize, chapter: Option<&str>, tokens: usize) -> Fragment {
        let frag = Fragment::new("book.pdf", Category::Book, position, format!("para {position}"), tokens);
        match chapter {
            Some(c) => frag.with_chapter(c),
            None => frag,
        }
    }

    #[test]
    fn chapter_change_after_floor_starts_new_document() {
        let fx = Fixture::new();
        let a = book(0, Some("Chapter 1"), 1200);
        let b = book(1, Some("Chapter 1"), 900);
        let c = book(2, Some("Chapter 2"), 300);

        let docs = ConceptsMerger.merge(&[&a, &b, &c], &fx.ctx());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Core Concepts - Chapter 1");
        assert_eq!(docs[0].source_fragments.len(), 2);
        assert_eq!(docs[1].title, "Core Concepts - Chapter 2");
        assert_eq!(docs[1].filename, "02_Core_Concepts___Chapter_2.md");
    }

    #[test]
    fn chapter_change_below_floor_keeps_accumulating() {
        let fx = Fixture::new();
        let a = book(0, Some("Chapter 1"), 500);
        let b = book(1, Some("Chapter 2"), 500);

        let docs = ConceptsMerger.merge(&[&a, &b], &fx.ctx());
        assert_eq!(docs.len(), 1);
        // title follows the last appended fragment
        assert_eq!(docs[0].title, "Core Concepts - Chapter 2");
    }

    #[test]
    fn ceiling_forces_a_break_within_a_chapter() {
        let fx = Fixture::new();
        let a = book(0, None, 3000);
        let b = book(1, None, 2500);

        let docs = ConceptsMerger.merge(&[&a, &b], &fx.ctx());
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.title == "Core Concepts - General"));
    }

    #[test]
    fn oversized_first_fragment_is_never_preceded_by_empty_document() {
        let fx = Fixture::new();
        let a = book(0, None, 9000);
        let docs = ConceptsMerger.merge(&[&a], &fx.ctx());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_fragments, vec![a.id().clone()]);
    }

    #[test]
    fn fragment_order_is_preserved() {
        let fx = Fixture::new();
        let frags: Vec<Fragment> = (0..6).map(|i| book(i, Some("Chapter 1"), 1500)).collect();
        let refs: Vec<&Fragment> = frags.iter().collect();

        let docs = ConceptsMerger.merge(&refs, &fx.ctx());
        let order: Vec<_> = docs.iter().flat_map(|d| d.source_fragments.clone()).collect();
        let expected: Vec<_> = frags.iter().map(|f| f.id().clone()).collect();
        assert_eq!(order, expected);
        assert_eq!(docs.len(), 2);
    }
}
