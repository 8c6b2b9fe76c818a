//! Framework records → one complete document each.
//!
//! Framework documents bypass grouping and merging entirely; the optimizer
//! never touches them either.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use tracing::{debug, instrument};

use knowledgepack_shared::{
    ConsolidatedDocument, Fragment, FragmentId, Framework, OutputCategory, TokenCounter,
};

use crate::naming::safe_stem;

/// Render every framework in name order.
///
/// `fragments` is the full intake sequence; it is only used to resolve the
/// source names of each framework's contributing fragment ids.
#[instrument(skip_all, fields(frameworks = frameworks.len()))]
pub fn build_framework_documents(
    frameworks: &BTreeMap<String, Framework>,
    fragments: &[&Fragment],
    counter: &dyn TokenCounter,
) -> Vec<ConsolidatedDocument> {
    let by_id: HashMap<&FragmentId, &Fragment> = fragments.iter().map(|&f| (f.id(), f)).collect();

    frameworks
        .values()
        .enumerate()
        .map(|(index, framework)| {
            let doc = framework_document(index, framework, &by_id, counter);
            debug!(framework = %framework.name, tokens = doc.total_tokens, "built framework document");
            doc
        })
        .collect()
}

fn framework_document(
    index: usize,
    framework: &Framework,
    by_id: &HashMap<&FragmentId, &Fragment>,
    counter: &dyn TokenCounter,
) -> ConsolidatedDocument {
    let content = render(framework);

    let mut source_files: Vec<String> = framework
        .source_fragments
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(|f| f.source().to_string())
        .collect();
    source_files.sort();
    source_files.dedup();

    ConsolidatedDocument {
        filename: format!("{:02}_{}_Framework_Complete.md", index + 1, safe_stem(&framework.name)),
        title: format!("{} Framework - Complete Guide", framework.name),
        category: OutputCategory::Frameworks,
        total_tokens: counter.count(&content),
        content,
        source_fragments: framework.source_fragments.clone(),
        source_files,
        keywords: vec![
            framework.name.to_lowercase(),
            "framework".into(),
            "system".into(),
            "method".into(),
        ],
        has_duplicates_removed: false,
        duplicate_count: 0,
    }
}

fn render(framework: &Framework) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {} Framework\n", framework.name);
    let _ = writeln!(out, "## Overview\n\n{}\n", framework.summary);
    let _ = writeln!(out, "## Complete Framework\n\n{}\n", framework.complete_text);

    if !framework.components.is_empty() {
        out.push_str("## Components\n\n");
        for component in &framework.components {
            let _ = writeln!(out, "### {}\n\n{}\n", component.name, component.description);
        }
    }

    let _ = write!(out, "## How to Apply\n\n{}\n", framework.application);
    out
}
