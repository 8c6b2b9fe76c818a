//! Framework isolation.
//!
//! Finds the fragments that describe a named framework and assembles one
//! [`Framework`] record per name, so the consolidation engine can emit each
//! framework as a single, unsplit document.
//!
//! Matching is catalog-driven: a fragment belongs to a catalog entry when its
//! text contains the entry's name, one of its aliases, or at least 70% of its
//! component names. Pattern discovery can additionally name frameworks the
//! catalog does not know.

mod extract;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use knowledgepack_shared::{Fragment, Framework, FrameworkEntry};

pub use extract::{extract_application, extract_components, extract_summary};

static NUMBERED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\s*[A-Z]'s)\s*(?:framework|model|system)").expect("valid regex")
});

static THE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)The\s+(\w+\s+\w+)\s+(?:Framework|Model|System)").expect("valid regex")
});

/// Group fragments by framework and build one record per framework.
///
/// Only frameworks with at least one matching fragment appear in the result.
#[instrument(skip_all, fields(fragments = fragments.len(), catalog = catalog.len(), discover_patterns))]
pub fn isolate_frameworks(
    fragments: &[Fragment],
    catalog: &[FrameworkEntry],
    discover_patterns: bool,
) -> BTreeMap<String, Framework> {
    let mut matched: BTreeMap<String, Vec<&Fragment>> = BTreeMap::new();

    for fragment in fragments {
        for entry in catalog {
            if mentions(fragment.text(), entry) {
                matched.entry(entry.name.clone()).or_default().push(fragment);
            }
        }

        if discover_patterns {
            for name in discover_names(fragment.text()) {
                let group = matched.entry(name).or_default();
                if !group.iter().any(|f| f.id() == fragment.id()) {
                    group.push(fragment);
                }
            }
        }
    }

    let frameworks: BTreeMap<String, Framework> = matched
        .into_iter()
        .map(|(name, group)| {
            let entry = catalog.iter().find(|e| e.name == name);
            let framework = assemble(&name, group, entry);
            debug!(framework = %name, fragments = framework.source_fragments.len(), "assembled framework");
            (name, framework)
        })
        .collect();

    info!(frameworks = frameworks.len(), "framework isolation complete");
    frameworks
}

/// Whether `text` refers to the catalog entry.
pub fn mentions(text: &str, entry: &FrameworkEntry) -> bool {
    if text.contains(entry.name.as_str()) {
        return true;
    }
    if entry.aliases.iter().any(|alias| text.contains(alias.as_str())) {
        return true;
    }
    if entry.components.is_empty() {
        return false;
    }

    let present = entry
        .components
        .iter()
        .filter(|component| text.contains(component.as_str()))
        .count();
    // at least 70% of the components
    present * 10 >= entry.components.len() * 7
}

/// Framework names announced by the text itself (`3 E's framework`,
/// `The Sovereign Consultant Model`).
pub fn discover_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = [&*NUMBERED_NAME_RE, &*THE_NAME_RE]
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn assemble(name: &str, mut group: Vec<&Fragment>, entry: Option<&FrameworkEntry>) -> Framework {
    group.sort_by(|a, b| {
        a.source()
            .cmp(b.source())
            .then_with(|| a.position().cmp(&b.position()))
    });

    let complete_text = group
        .iter()
        .map(|f| f.text())
        .collect::<Vec<_>>()
        .join("\n\n");

    let components = extract_components(&complete_text, entry.map(|e| e.components.as_slice()));
    let summary = extract_summary(name, &complete_text, &components);
    let application = extract_application(&complete_text);

    Framework {
        name: name.to_string(),
        source_fragments: group.iter().map(|f| f.id().clone()).collect(),
        complete_text,
        components,
        summary,
        application,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledgepack_shared::{AppConfig, Category, WordEstimate};

    fn catalog() -> Vec<FrameworkEntry> {
        vec![FrameworkEntry {
            name: "3 E's".into(),
            components: vec!["Energy".into(), "Earnings".into(), "Experience".into()],
            aliases: vec!["Three E's".into()],
        }]
    }

    fn frag(source: &str, position: usize, text: &str) -> Fragment {
        Fragment::new(source, Category::Book, position, text, 10)
    }

    #[test]
    fn name_alias_and_components_all_match() {
        let entry = &catalog()[0];
        assert!(mentions("Apply the 3 E's today.", entry));
        assert!(mentions("The Three E's are simple.", entry));
        assert!(mentions("Energy and Earnings and Experience.", entry));
        // 2 of 3 components is under 70%
        assert!(!mentions("Energy and Earnings.", entry));
        assert!(!mentions("Nothing relevant here.", entry));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!mentions("the 3 e's", &catalog()[0]));
    }

    #[test]
    fn isolate_collects_fragments_in_source_order() {
        let b = frag("b.pdf", 0, "More on the 3 E's.");
        let a1 = frag("a.pdf", 1, "Energy, Earnings, Experience.");
        let a0 = frag("a.pdf", 0, "The 3 E's matter.");
        let other = frag("a.pdf", 2, "Unrelated text.");

        let frameworks = isolate_frameworks(&[b.clone(), a1.clone(), a0.clone(), other], &catalog(), false);
        assert_eq!(frameworks.len(), 1);

        let fw = &frameworks["3 E's"];
        assert_eq!(
            fw.source_fragments,
            vec![a0.id().clone(), a1.id().clone(), b.id().clone()]
        );
        assert_eq!(
            fw.complete_text,
            "The 3 E's matter.\n\nEnergy, Earnings, Experience.\n\nMore on the 3 E's."
        );
    }

    #[test]
    fn unmatched_catalog_entries_are_absent() {
        let frameworks = isolate_frameworks(&[frag("a.pdf", 0, "Nothing.")], &catalog(), false);
        assert!(frameworks.is_empty());
    }

    #[test]
    fn discovery_is_off_by_default() {
        let f = frag("a.pdf", 0, "The Offer Ladder Model works.");
        assert!(isolate_frameworks(&[f.clone()], &[], false).is_empty());

        let found = isolate_frameworks(&[f], &[], true);
        assert!(found.contains_key("Offer Ladder"));
    }

    #[test]
    fn discover_names_finds_both_patterns() {
        let names = discover_names("Use the 4 P's framework. The Client Ascension System helps.");
        assert_eq!(names, vec!["4 P's".to_string(), "Client Ascension".to_string()]);
    }

    #[test]
    fn fixture_corpus_yields_three_es() {
        let fragments = knowledgepack_intake::load_fragments(
            std::path::Path::new("../../../fixtures/json/fragments.fixture.json"),
            &WordEstimate::default(),
        )
        .expect("fragments fixture should load");

        let frameworks = isolate_frameworks(&fragments, &AppConfig::default().frameworks, false);
        assert_eq!(frameworks.len(), 1);

        let fw = &frameworks["3 E's"];
        assert_eq!(fw.source_fragments.len(), 2);
        assert_eq!(fw.summary, "The 3 E's framework consists of Energy, Earnings, Experience.");
    }
}
