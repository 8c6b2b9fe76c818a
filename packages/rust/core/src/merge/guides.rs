//! Per-source mergers: guides and stray framework notes.

use tracing::debug;

use knowledgepack_shared::{ConsolidatedDocument, Fragment, OutputCategory};

use super::{MergeContext, MergeStrategy, build_document, by_source, fill_parts};
use crate::naming::title_from_source;

/// One document per guide source, in position order.
///
/// Exception: a guide whose total exceeds the token ceiling becomes several
/// `"{title} - Part {n}"` documents instead of one, so no guide document
/// breaks the ceiling by more than one fragment.
pub struct GuideMerger;

impl MergeStrategy for GuideMerger {
    fn name(&self) -> &'static str {
        "guides"
    }

    fn output(&self) -> OutputCategory {
        OutputCategory::Guides
    }

    fn merge(&self, fragments: &[&Fragment], ctx: &MergeContext<'_>) -> Vec<ConsolidatedDocument> {
        per_source(self.output(), fragments, ctx, title_from_source)
    }
}

/// Framework-category fragments that no isolated framework captured.
pub struct FrameworkNotesMerger;

impl MergeStrategy for FrameworkNotesMerger {
    fn name(&self) -> &'static str {
        "framework_notes"
    }

    fn output(&self) -> OutputCategory {
        OutputCategory::Frameworks
    }

    fn merge(&self, fragments: &[&Fragment], ctx: &MergeContext<'_>) -> Vec<ConsolidatedDocument> {
        per_source(self.output(), fragments, ctx, |source| {
            format!("{} Framework Notes", title_from_source(source))
        })
    }
}

fn per_source(
    output: OutputCategory,
    fragments: &[&Fragment],
    ctx: &MergeContext<'_>,
    title_for: impl Fn(&str) -> String,
) -> Vec<ConsolidatedDocument> {
    let mut docs = Vec::new();

    for run in by_source(fragments) {
        let title = title_for(run[0].source());
        let parts = fill_parts(run, ctx.config.max_tokens);

        if parts.len() == 1 {
            docs.push(build_document(ctx, output, &title, run, docs.len()));
            continue;
        }

        debug!(source = run[0].source(), parts = parts.len(), %output, "splitting long source");
        for (n, part) in parts.iter().enumerate() {
            let part_title = format!("{title} - Part {}", n + 1);
            docs.push(build_document(ctx, output, &part_title, part, docs.len()));
        }
    }

    docs
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use knowledgepack_shared::Category;

    #[test]
    fn three_guide_fragments_make_one_document() {
        let fx = Fixture::new();
        let frags: Vec<Fragment> = ["Step one.", "Step two.", "Step three."]
            .iter()
            .enumerate()
            .map(|(i, text)| Fragment::new("A.txt", Category::Guide, i, *text, 3))
            .collect();
        let refs: Vec<&Fragment> = frags.iter().collect();

        let docs = GuideMerger.merge(&refs, &fx.ctx());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Step one.\n\nStep two.\n\nStep three.");
        assert_eq!(docs[0].title, "A");
        assert_eq!(docs[0].category, OutputCategory::Guides);
        assert_eq!(docs[0].source_files, vec!["A.txt"]);
    }

    #[test]
    fn each_source_gets_its_own_guide() {
        let fx = Fixture::new();
        let a = Fragment::new("setup_guide.md", Category::Guide, 0, "a", 1);
        let b = Fragment::new("launch_guide.md", Category::Guide, 0, "b", 1);
        // grouper output is ordered by source
        let docs = GuideMerger.merge(&[&b, &a], &fx.ctx());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Launch Guide");
        assert_eq!(docs[1].title, "Setup Guide");
    }

    #[test]
    fn oversized_guide_is_split_into_parts() {
        let fx = Fixture::new();
        let a = Fragment::new("big.pdf", Category::Guide, 0, "first half", 4000);
        let b = Fragment::new("big.pdf", Category::Guide, 1, "second half", 4000);

        let docs = GuideMerger.merge(&[&a, &b], &fx.ctx());
        let titles: Vec<_> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Big - Part 1", "Big - Part 2"]);
    }

    #[test]
    fn framework_notes_go_to_frameworks_bucket() {
        let fx = Fixture::new();
        let a = Fragment::new("offer_models.txt", Category::Framework, 0, "notes", 1);

        let docs = FrameworkNotesMerger.merge(&[&a], &fx.ctx());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Offer Models Framework Notes");
        assert_eq!(docs[0].category, OutputCategory::Frameworks);
    }
}
