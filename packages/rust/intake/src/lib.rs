//! Fragment and framework intake.
//!
//! Reads pre-chunked, pre-classified fragment records from JSON or JSON Lines
//! and turns them into immutable [`Fragment`]s. Chunking and classification
//! happen upstream; this crate only validates and measures.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use knowledgepack_shared::{Category, Fragment, Framework, KnowledgePackError, Result, TokenCounter};

/// One fragment record as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct FragmentRecord {
    pub text: String,
    pub source: String,
    pub category: Category,
    pub position: usize,
    /// Measured with the configured counter when absent.
    #[serde(default)]
    pub tokens: Option<usize>,
    #[serde(default)]
    pub chapter: Option<String>,
}

/// On-disk layout of a fragment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// A single JSON array of records.
    Json,
    /// One JSON record per non-blank line.
    JsonLines,
}

impl RecordFormat {
    /// `.jsonl` / `.ndjson` are JSON Lines; anything else is a JSON array.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl" | "ndjson") => Self::JsonLines,
            _ => Self::Json,
        }
    }
}

/// Load and validate fragments from `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_fragments(path: &Path, counter: &dyn TokenCounter) -> Result<Vec<Fragment>> {
    let raw = std::fs::read_to_string(path).map_err(|e| KnowledgePackError::io(path, e))?;
    let fragments = parse_fragments(&raw, RecordFormat::from_path(path), counter)?;
    info!(fragments = fragments.len(), "loaded fragments");
    Ok(fragments)
}

/// Parse and validate fragment records from an in-memory string.
pub fn parse_fragments(
    raw: &str,
    format: RecordFormat,
    counter: &dyn TokenCounter,
) -> Result<Vec<Fragment>> {
    let records = match format {
        RecordFormat::Json => serde_json::from_str::<Vec<FragmentRecord>>(raw)
            .map_err(|e| KnowledgePackError::parse(format!("invalid fragment array: {e}")))?,
        RecordFormat::JsonLines => parse_lines(raw)?,
    };

    let mut seen = HashSet::new();
    let mut fragments = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        if record.source.trim().is_empty() {
            return Err(KnowledgePackError::validation(format!(
                "record {index} has a blank source"
            )));
        }
        if record.text.trim().is_empty() {
            return Err(KnowledgePackError::validation(format!(
                "record {index} ({}) has blank text",
                record.source
            )));
        }
        if !seen.insert((record.source.clone(), record.position)) {
            return Err(KnowledgePackError::validation(format!(
                "record {index} repeats position {} of {}",
                record.position, record.source
            )));
        }

        let tokens = record.tokens.unwrap_or_else(|| counter.count(&record.text));
        let fragment = Fragment::new(record.source, record.category, record.position, record.text, tokens);
        fragments.push(match record.chapter {
            Some(chapter) => fragment.with_chapter(chapter),
            None => fragment,
        });
    }

    debug!(fragments = fragments.len(), "fragment records validated");
    Ok(fragments)
}

fn parse_lines(raw: &str) -> Result<Vec<FragmentRecord>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                KnowledgePackError::parse(format!("invalid fragment on line {}: {e}", n + 1))
            })
        })
        .collect()
}

/// Load framework records from a JSON array, keyed by name.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_frameworks(path: &Path) -> Result<BTreeMap<String, Framework>> {
    let raw = std::fs::read_to_string(path).map_err(|e| KnowledgePackError::io(path, e))?;
    let frameworks = parse_frameworks(&raw)?;
    info!(frameworks = frameworks.len(), "loaded frameworks");
    Ok(frameworks)
}

/// Parse framework records, rejecting blank or repeated names.
pub fn parse_frameworks(raw: &str) -> Result<BTreeMap<String, Framework>> {
    let records: Vec<Framework> = serde_json::from_str(raw)
        .map_err(|e| KnowledgePackError::parse(format!("invalid framework array: {e}")))?;

    let mut frameworks = BTreeMap::new();
    for (index, framework) in records.into_iter().enumerate() {
        if framework.name.trim().is_empty() {
            return Err(KnowledgePackError::validation(format!(
                "framework {index} has a blank name"
            )));
        }
        let name = framework.name.clone();
        if frameworks.insert(name.clone(), framework).is_some() {
            return Err(KnowledgePackError::validation(format!(
                "framework {name} is defined twice"
            )));
        }
    }
    Ok(frameworks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledgepack_shared::{FragmentId, WordEstimate};

    #[test]
    fn fixture_fragments_load() {
        let raw = std::fs::read_to_string("../../../fixtures/json/fragments.fixture.json")
            .expect("fragments fixture should exist");
        let fragments = parse_fragments(&raw, RecordFormat::Json, &WordEstimate::default())
            .expect("fixture should parse");

        assert_eq!(fragments.len(), 9);
        assert_eq!(fragments[0].chapter(), Some("Chapter 1"));
        assert_eq!(fragments[0].id(), &FragmentId::derive("sovereign_consultant.pdf", 0));
        assert_eq!(fragments[3].category(), Category::Transcript);
    }

    #[test]
    fn missing_tokens_are_measured() {
        let raw = r#"[{"text": "one two three four", "source": "a.txt", "category": "guide", "position": 0}]"#;
        let fragments = parse_fragments(raw, RecordFormat::Json, &WordEstimate::default()).unwrap();
        assert_eq!(fragments[0].tokens(), 6);
    }

    #[test]
    fn json_lines_skip_blank_lines() {
        let raw = concat!(
            r#"{"text": "a", "source": "a.txt", "category": "guide", "position": 0, "tokens": 1}"#,
            "\n\n",
            r#"{"text": "b", "source": "a.txt", "category": "guide", "position": 1, "tokens": 1}"#,
            "\n",
        );
        let fragments = parse_fragments(raw, RecordFormat::JsonLines, &WordEstimate::default()).unwrap();
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn json_lines_error_names_line() {
        let raw = "{\"text\": \"a\", \"source\": \"a.txt\", \"category\": \"guide\", \"position\": 0}\nnot json\n";
        let err = parse_fragments(raw, RecordFormat::JsonLines, &WordEstimate::default()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn blank_source_names_record() {
        let raw = r#"[
            {"text": "ok", "source": "a.txt", "category": "guide", "position": 0},
            {"text": "ok", "source": " ", "category": "guide", "position": 0}
        ]"#;
        let err = parse_fragments(raw, RecordFormat::Json, &WordEstimate::default()).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn repeated_position_is_rejected() {
        let raw = r#"[
            {"text": "a", "source": "a.txt", "category": "guide", "position": 0},
            {"text": "b", "source": "a.txt", "category": "guide", "position": 0}
        ]"#;
        let err = parse_fragments(raw, RecordFormat::Json, &WordEstimate::default()).unwrap_err();
        assert!(err.to_string().contains("repeats position 0"));
    }

    #[test]
    fn unknown_category_is_a_parse_error() {
        let raw = r#"[{"text": "a", "source": "a.txt", "category": "video", "position": 0}]"#;
        let err = parse_fragments(raw, RecordFormat::Json, &WordEstimate::default()).unwrap_err();
        assert!(matches!(err, KnowledgePackError::Parse { .. }));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(RecordFormat::from_path(Path::new("x.jsonl")), RecordFormat::JsonLines);
        assert_eq!(RecordFormat::from_path(Path::new("x.json")), RecordFormat::Json);
        assert_eq!(RecordFormat::from_path(Path::new("x")), RecordFormat::Json);
    }

    #[test]
    fn fixture_frameworks_load() {
        let raw = std::fs::read_to_string("../../../fixtures/json/frameworks.fixture.json")
            .expect("frameworks fixture should exist");
        let frameworks = parse_frameworks(&raw).expect("fixture should parse");
        assert_eq!(frameworks.len(), 1);
        assert_eq!(frameworks["3 E's"].components.len(), 3);
    }

    #[test]
    fn duplicate_framework_names_are_rejected() {
        let raw = r#"[
            {"name": "X", "complete_text": "a", "summary": "s", "application": "p"},
            {"name": "X", "complete_text": "b", "summary": "s", "application": "p"}
        ]"#;
        assert!(parse_frameworks(raw).is_err());
    }
}
