//! Titles and filesystem-safe filenames for consolidated documents.

/// Extensions stripped from source names when deriving titles.
const SOURCE_EXTENSIONS: [&str; 3] = [".txt", ".pdf", ".md"];

/// Derive a human title from a source document name.
///
/// `sales_call_03.txt` becomes `Sales Call 03`.
pub fn title_from_source(source: &str) -> String {
    let stem = SOURCE_EXTENSIONS
        .iter()
        .fold(source, |name, ext| name.strip_suffix(ext).unwrap_or(name));

    let title = stem
        .replace('_', " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        return "Untitled".to_string();
    }
    title
}

/// Map a title to a filename stem: spaces and hyphens become underscores,
/// anything else that is not alphanumeric or `_` is dropped.
pub fn safe_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// `"{index+1:02}_{safe_stem}.md"`.
pub fn document_filename(index: usize, title: &str) -> String {
    format!("{:02}_{}.md", index + 1, safe_stem(title))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => {
            let upper: String = c.to_uppercase().collect();
            format!("{upper}{}", chars.as_str().to_lowercase())
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_source_strips_extension_and_cases() {
        assert_eq!(title_from_source("sales_call_03.txt"), "Sales Call 03");
        assert_eq!(title_from_source("ONBOARDING_guide.pdf"), "Onboarding Guide");
        assert_eq!(title_from_source("notes.md"), "Notes");
        assert_eq!(title_from_source("A.txt"), "A");
    }

    #[test]
    fn title_from_source_never_empty() {
        assert_eq!(title_from_source(".txt"), "Untitled");
    }

    #[test]
    fn safe_stem_drops_punctuation() {
        assert_eq!(safe_stem("Core Concepts - Chapter 1"), "Core_Concepts___Chapter_1");
        assert_eq!(safe_stem("3 E's"), "3_Es");
        assert_eq!(safe_stem("$100 Workshop"), "100_Workshop");
    }

    #[test]
    fn document_filename_is_one_based() {
        assert_eq!(document_filename(0, "Email Templates Collection"), "01_Email_Templates_Collection.md");
        assert_eq!(document_filename(11, "Guide"), "12_Guide.md");
    }
}
