//! Transcript fragments → one document per call, split into parts when long.

use tracing::debug;

use knowledgepack_shared::{ConsolidatedDocument, Fragment, OutputCategory};

use super::{MergeContext, MergeStrategy, build_document, by_source, fill_parts};
use crate::naming::title_from_source;

pub struct TranscriptMerger;

impl MergeStrategy for TranscriptMerger {
    fn name(&self) -> &'static str {
        "transcripts"
    }

    fn output(&self) -> OutputCategory {
        OutputCategory::Transcripts
    }

    fn merge(&self, fragments: &[&Fragment], ctx: &MergeContext<'_>) -> Vec<ConsolidatedDocument> {
        let mut docs = Vec::new();

        for run in by_source(fragments) {
            let title = title_from_source(run[0].source());
            let total: usize = run.iter().map(|f| f.tokens()).sum();

            if total <= ctx.config.max_tokens {
                docs.push(build_document(ctx, self.output(), &title, run, docs.len()));
                continue;
            }

            let parts = fill_parts(run, ctx.config.max_tokens);
            debug!(source = run[0].source(), total, parts = parts.len(), "splitting long transcript");
            for (n, part) in parts.iter().enumerate() {
                let part_title = format!("{title} - Part {}", n + 1);
                docs.push(build_document(ctx, self.output(), &part_title, part, docs.len()));
            }
        }

        docs
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use knowledgepack_shared::Category;

    fn line(source: &str, position: usize, tokens: usize) -> Fragment {
        Fragment::new(source, Category::Transcript, position, format!("{source} line {position}"), tokens)
    }

    #[test]
    fn short_transcripts_stay_whole() {
        let fx = Fixture::new();
        let a0 = line("call_one.txt", 0, 100);
        let a1 = line("call_one.txt", 1, 100);
        let b0 = line("call_two.txt", 0, 100);

        let docs = TranscriptMerger.merge(&[&a0, &a1, &b0], &fx.ctx());
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Call One");
        assert_eq!(docs[0].content, "call_one.txt line 0\n\ncall_one.txt line 1");
        assert_eq!(docs[1].title, "Call Two");
        assert_eq!(docs[1].filename, "02_Call_Two.md");
    }

    #[test]
    fn long_transcript_splits_into_ordered_parts() {
        let fx = Fixture::new();
        let frags: Vec<Fragment> = (0..4).map(|i| line("coaching_call.txt", i, 2000)).collect();
        let refs: Vec<&Fragment> = frags.iter().collect();

        let docs = TranscriptMerger.merge(&refs, &fx.ctx());
        let titles: Vec<_> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Coaching Call - Part 1", "Coaching Call - Part 2"]);
        assert_eq!(docs[0].source_fragments, vec![frags[0].id().clone(), frags[1].id().clone()]);
        assert_eq!(docs[1].source_fragments, vec![frags[2].id().clone(), frags[3].id().clone()]);
    }

    #[test]
    fn parts_respect_ceiling_by_declared_tokens() {
        let fx = Fixture::new();
        let frags: Vec<Fragment> = (0..7).map(|i| line("long.txt", i, 1700)).collect();
        let refs: Vec<&Fragment> = frags.iter().collect();

        let docs = TranscriptMerger.merge(&refs, &fx.ctx());
        for doc in &docs {
            let declared: usize = doc
                .source_fragments
                .iter()
                .map(|id| frags.iter().find(|f| f.id() == id).map_or(0, |f| f.tokens()))
                .sum();
            assert!(declared <= fx.config.max_tokens);
        }
        assert_eq!(docs.len(), 4);
    }
}
