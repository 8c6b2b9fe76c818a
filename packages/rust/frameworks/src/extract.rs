//! Component, summary and application extraction from framework text.

use std::sync::LazyLock;

use regex::Regex;

use knowledgepack_shared::FrameworkComponent;

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:summary|overview|in short|simply put)[:\s]+([^.]+\.)").expect("valid regex")
});

static APPLICATION_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(?:how to apply|application|implementation|using this)[:\s]+([^.]+\.(?:[^.]+\.)?)")
            .expect("valid regex"),
        Regex::new(r"(?i)(?:steps?|process|approach)[:\s]+([^.]+\.(?:[^.]+\.)?)").expect("valid regex"),
        Regex::new(r"(?i)To\s+(?:use|apply|implement)\s+[^,]+,\s+([^.]+\.)").expect("valid regex"),
    ]
});

static NUMBERED_STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d+\.?\s+([^\n]+)").expect("valid regex")
});

/// Minimum paragraph length for the component fallback.
const PARAGRAPH_MIN_CHARS: usize = 50;

const DEFAULT_APPLICATION: &str =
    "See the complete framework description for detailed application guidelines.";

/// Components in presentation order.
///
/// With catalog component names, each name is looked up in the text and kept
/// only if a description is found. Without them, bullet (`- `, `• `, `1.`)
/// and bold (`**Name**:`) list lines of the form `name: description` are
/// collected instead.
pub fn extract_components(text: &str, known: Option<&[String]>) -> Vec<FrameworkComponent> {
    match known {
        Some(names) => names
            .iter()
            .filter_map(|name| {
                component_text(text, name).map(|description| FrameworkComponent {
                    name: name.clone(),
                    description,
                })
            })
            .collect(),
        None => list_components(text),
    }
}

fn component_text(text: &str, component: &str) -> Option<String> {
    let escaped = regex::escape(component);
    let patterns = [
        format!(r"(?i){escaped}[:\s]+([^.]+\.(?:[^.]+\.)?)"),
        format!(r"(?i)\b{escaped}\b[^.]*?means?\s+([^.]+\.)"),
        format!(r"(?i)\b{escaped}\b[^.]*?is\s+([^.]+\.)"),
    ];

    for pattern in &patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if let Some(m) = re.captures(text).and_then(|caps| caps.get(1)) {
            return Some(m.as_str().trim().to_string());
        }
    }

    text.split("\n\n")
        .find(|para| para.contains(component) && para.chars().count() > PARAGRAPH_MIN_CHARS)
        .map(|para| para.trim().to_string())
}

fn list_components(text: &str) -> Vec<FrameworkComponent> {
    let mut components: Vec<FrameworkComponent> = Vec::new();

    for line in text.lines() {
        let Some((name, description)) = list_item(line.trim_start()) else {
            continue;
        };
        if components.iter().any(|c| c.name == name) {
            continue;
        }
        components.push(FrameworkComponent {
            name: name.to_string(),
            description: description.to_string(),
        });
    }

    components
}

/// Split a bullet or bold list line into `(name, description)`.
fn list_item(line: &str) -> Option<(&str, &str)> {
    let (name, description) = if let Some(rest) = line.strip_prefix("**") {
        let (name, after) = rest.split_once("**")?;
        (name, after.strip_prefix(':')?)
    } else {
        strip_marker(line)?.split_once(':')?
    };

    let name = name.trim();
    let description = description.trim();
    if name.is_empty() || description.is_empty() {
        return None;
    }
    Some((name, description))
}

fn strip_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix('-').or_else(|| line.strip_prefix('•')) {
        return Some(rest);
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    Some(rest.strip_prefix('.').unwrap_or(rest))
}

/// An explicit summary sentence, else a sentence built from the components,
/// else a sentence naming the framework, else a generic line.
pub fn extract_summary(name: &str, text: &str, components: &[FrameworkComponent]) -> String {
    if let Some(m) = SUMMARY_RE.captures(text).and_then(|caps| caps.get(1)) {
        return m.as_str().trim().to_string();
    }

    let named = format!(r"(?i)The\s+{}\s+(?:is|helps|enables)\s+([^.]+\.)", regex::escape(name));
    let explicit = Regex::new(&named)
        .ok()
        .and_then(|re| re.captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str().trim().to_string()));
    if let Some(summary) = explicit {
        return summary;
    }

    if !components.is_empty() {
        let names = components
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return format!("The {name} framework consists of {names}.");
    }

    if let Some(sentence) = text.split('.').find(|s| {
        let len = s.chars().count();
        s.contains(name) && len > 50 && len < 200
    }) {
        return format!("{}.", sentence.trim());
    }

    format!("The {name} is a comprehensive framework for business transformation.")
}

/// An explicit how-to passage, else the first five numbered steps when there
/// are at least three, else a pointer to the complete text.
pub fn extract_application(text: &str) -> String {
    for re in APPLICATION_RES.iter() {
        if let Some(m) = re.captures(text).and_then(|caps| caps.get(1)) {
            return m.as_str().trim().to_string();
        }
    }

    let steps: Vec<&str> = NUMBERED_STEP_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .collect();
    if steps.len() >= 3 {
        let list = steps
            .iter()
            .take(5)
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        return format!("Application steps:\n{list}");
    }

    DEFAULT_APPLICATION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_components_use_description_sentences() {
        let text = "Energy: the fuel you bring. Earnings means the money it pays. Experience.";
        let known = vec!["Energy".to_string(), "Earnings".to_string(), "Missing".to_string()];

        let components = extract_components(text, Some(&known));
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].name, "Energy");
        assert_eq!(components[0].description, "the fuel you bring. Earnings means the money it pays.");
        assert_eq!(components[1].name, "Earnings");
    }

    #[test]
    fn component_falls_back_to_paragraph() {
        let text = "Short.\n\nThis paragraph talks about Pipeline health over many many words here";
        let known = vec!["Pipeline".to_string()];
        let components = extract_components(text, Some(&known));
        assert_eq!(components.len(), 1);
        assert!(components[0].description.starts_with("This paragraph"));
    }

    #[test]
    fn list_lines_become_components() {
        let text = "Intro line\n- Attract: bring leads in\n2. Convert: close them\n**Deliver**: do the work\n• Nope without colon\n";
        let components = extract_components(text, None);
        let names: Vec<_> = components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Attract", "Convert", "Deliver"]);
        assert_eq!(components[2].description, "do the work");
    }

    #[test]
    fn summary_prefers_explicit_sentence() {
        let text = "In short: pick work that pays and energizes. More text.";
        assert_eq!(extract_summary("3 E's", text, &[]), "pick work that pays and energizes.");
    }

    #[test]
    fn summary_from_named_sentence() {
        let text = "The Hybrid Offer helps you sell at every price point. Details follow.";
        assert_eq!(
            extract_summary("Hybrid Offer", text, &[]),
            "you sell at every price point."
        );
    }

    #[test]
    fn summary_falls_back_to_default() {
        assert_eq!(
            extract_summary("X", "Nothing here", &[]),
            "The X is a comprehensive framework for business transformation."
        );
    }

    #[test]
    fn application_from_numbered_steps() {
        let text = "1. Pick a niche\n2. Write the offer\n3. Book calls\n";
        assert_eq!(
            extract_application(text),
            "Application steps:\n- Pick a niche\n- Write the offer\n- Book calls"
        );
    }

    #[test]
    fn application_from_how_to_sentence() {
        let text = "How to apply: score every offer. Then decide.";
        assert_eq!(extract_application(text), "score every offer. Then decide.");
    }

    #[test]
    fn application_default_pointer() {
        assert_eq!(extract_application("Plain words"), DEFAULT_APPLICATION);
    }
}
