//! Template and email fragments → three fixed collections.

use knowledgepack_shared::{Category, ConsolidatedDocument, Fragment, OutputCategory};

use super::{MergeContext, MergeStrategy, build_document};

/// Buckets in output order; the position doubles as the filename index.
const COLLECTIONS: [&str; 3] = [
    "Email Templates Collection",
    "Offer Templates Collection",
    "Business Templates Collection",
];

/// Sorts template-like content into email, offer and residual collections.
///
/// Template fragments come before email fragments. Collections are never
/// split, so they may exceed the token ceiling.
pub struct TemplateMerger;

impl MergeStrategy for TemplateMerger {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn output(&self) -> OutputCategory {
        OutputCategory::Templates
    }

    fn merge(&self, fragments: &[&Fragment], ctx: &MergeContext<'_>) -> Vec<ConsolidatedDocument> {
        let ordered = fragments
            .iter()
            .filter(|f| f.category() == Category::Template)
            .chain(fragments.iter().filter(|f| f.category() != Category::Template));

        let mut buckets: [Vec<&Fragment>; 3] = Default::default();
        for &fragment in ordered {
            buckets[bucket_of(fragment.text())].push(fragment);
        }

        COLLECTIONS
            .iter()
            .zip(buckets.iter())
            .enumerate()
            .filter(|(_, (_, bucket))| !bucket.is_empty())
            .map(|(index, (title, bucket))| build_document(ctx, self.output(), title, bucket, index))
            .collect()
    }
}

fn bucket_of(text: &str) -> usize {
    let lower = text.to_lowercase();
    if lower.contains("email") || lower.contains("subject:") {
        0
    } else if lower.contains("offer") || lower.contains("package") {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    #[test]
    fn fragments_land_in_fixed_collections() {
        let fx = Fixture::new();
        let email = Fragment::new("inbox.txt", Category::Email, 0, "Subject: Welcome aboard", 5);
        let offer = Fragment::new("tpl.txt", Category::Template, 0, "The premium package includes", 5);
        let other = Fragment::new("tpl.txt", Category::Template, 1, "Meeting agenda outline", 5);

        let docs = TemplateMerger.merge(&[&email, &offer, &other], &fx.ctx());
        let titles: Vec<_> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, COLLECTIONS.to_vec());
        assert_eq!(docs[2].filename, "03_Business_Templates_Collection.md");
    }

    #[test]
    fn empty_buckets_keep_fixed_indices() {
        let fx = Fixture::new();
        let other = Fragment::new("tpl.txt", Category::Template, 0, "Checklist", 5);

        let docs = TemplateMerger.merge(&[&other], &fx.ctx());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "03_Business_Templates_Collection.md");
    }

    #[test]
    fn templates_precede_emails_within_a_bucket() {
        let fx = Fixture::new();
        let email = Fragment::new("a_inbox.txt", Category::Email, 0, "email one", 5);
        let template = Fragment::new("z_tpl.txt", Category::Template, 0, "email template", 5);

        let docs = TemplateMerger.merge(&[&email, &template], &fx.ctx());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "email template\n\nemail one");
    }
}
