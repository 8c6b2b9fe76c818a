//! Partition fragments by category in source order.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use knowledgepack_shared::{Category, Fragment};

/// Group fragments by category, each group ordered by (source, position).
///
/// The sort is stable, so fragments sharing a (source, position) pair keep
/// their incoming order.
#[instrument(skip_all, fields(fragments = fragments.len()))]
pub fn group_by_category<'a>(fragments: &[&'a Fragment]) -> BTreeMap<Category, Vec<&'a Fragment>> {
    let mut grouped: BTreeMap<Category, Vec<&'a Fragment>> = BTreeMap::new();

    for &fragment in fragments {
        grouped.entry(fragment.category()).or_default().push(fragment);
    }

    for (category, group) in grouped.iter_mut() {
        group.sort_by(|a, b| {
            a.source()
                .cmp(b.source())
                .then_with(|| a.position().cmp(&b.position()))
        });
        debug!(%category, fragments = group.len(), "grouped fragments");
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_partitioned_and_ordered() {
        let b2 = Fragment::new("b.pdf", Category::Book, 2, "b2", 1);
        let a1 = Fragment::new("a.pdf", Category::Book, 1, "a1", 1);
        let g0 = Fragment::new("guide.pdf", Category::Guide, 0, "g0", 1);
        let a0 = Fragment::new("a.pdf", Category::Book, 0, "a0", 1);
        let input = vec![&b2, &g0, &a1, &a0];

        let grouped = group_by_category(&input);
        assert_eq!(grouped.len(), 2);

        let books: Vec<_> = grouped[&Category::Book].iter().map(|f| f.text()).collect();
        assert_eq!(books, vec!["a0", "a1", "b2"]);
        assert_eq!(grouped[&Category::Guide].len(), 1);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_category(&[]).is_empty());
    }

    #[test]
    fn every_fragment_stays_in_its_category() {
        let t = Fragment::new("call.txt", Category::Transcript, 0, "t", 1);
        let e = Fragment::new("mail.txt", Category::Email, 0, "e", 1);
        let input = vec![&t, &e];

        let grouped = group_by_category(&input);
        for (category, group) in &grouped {
            assert!(group.iter().all(|f| f.category() == *category));
        }
    }
}
