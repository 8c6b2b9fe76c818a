//! Core domain types for knowledgepack corpora.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Document-type category assigned to every fragment at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Long-form book content.
    Book,
    /// Spoken-transcript content.
    Transcript,
    /// Reusable framework content.
    Framework,
    /// Reusable template content.
    Template,
    /// Email content.
    Email,
    /// Instructional guide content.
    Guide,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 6] = [
        Self::Book,
        Self::Transcript,
        Self::Framework,
        Self::Template,
        Self::Email,
        Self::Guide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Transcript => "transcript",
            Self::Framework => "framework",
            Self::Template => "template",
            Self::Email => "email",
            Self::Guide => "guide",
        }
    }

    /// The output category whose documents carry fragments of this category.
    pub fn output(&self) -> OutputCategory {
        match self {
            Self::Book => OutputCategory::CoreConcepts,
            Self::Transcript => OutputCategory::Transcripts,
            Self::Framework => OutputCategory::Frameworks,
            Self::Template | Self::Email => OutputCategory::Templates,
            Self::Guide => OutputCategory::Guides,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OutputCategory
// ---------------------------------------------------------------------------

/// One of the five fixed buckets handed to the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputCategory {
    Frameworks,
    CoreConcepts,
    Transcripts,
    Templates,
    Guides,
}

impl OutputCategory {
    /// Every output category, in emission order.
    pub const ALL: [OutputCategory; 5] = [
        Self::Frameworks,
        Self::CoreConcepts,
        Self::Transcripts,
        Self::Templates,
        Self::Guides,
    ];

    /// Directory and manifest key for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frameworks => "frameworks",
            Self::CoreConcepts => "core_concepts",
            Self::Transcripts => "transcripts",
            Self::Templates => "templates",
            Self::Guides => "guides",
        }
    }
}

impl std::fmt::Display for OutputCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FragmentId
// ---------------------------------------------------------------------------

/// Stable fragment identifier derived from source name and position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(pub String);

impl FragmentId {
    /// First 16 hex chars of `sha256("{source}_{position}")`.
    pub fn derive(source: &str, position: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{source}_{position}").as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        Self(digest[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// An immutable unit of source text.
///
/// Fields are private: a fragment is fixed at creation and merging always
/// produces new documents rather than editing fragments in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    id: FragmentId,
    text: String,
    source: String,
    category: Category,
    position: usize,
    tokens: usize,
    chapter: Option<String>,
}

impl Fragment {
    pub fn new(
        source: impl Into<String>,
        category: Category,
        position: usize,
        text: impl Into<String>,
        tokens: usize,
    ) -> Self {
        let source = source.into();
        Self {
            id: FragmentId::derive(&source, position),
            text: text.into(),
            source,
            category,
            position,
            tokens,
            chapter: None,
        }
    }

    /// Attach a structural marker (chapter label) at creation time.
    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn id(&self) -> &FragmentId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Token length as measured at intake.
    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn chapter(&self) -> Option<&str> {
        self.chapter.as_deref()
    }

    /// Character mass (Unicode scalar values) used for preservation accounting.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Framework
// ---------------------------------------------------------------------------

/// A named sub-component of a framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkComponent {
    pub name: String,
    pub description: String,
}

/// A named conceptual unit assembled from the fragments that reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    /// Canonical name (e.g., `3 E's`).
    pub name: String,
    /// All contributing fragment texts joined by blank lines.
    pub complete_text: String,
    /// Components in catalog or discovery order.
    #[serde(default)]
    pub components: Vec<FrameworkComponent>,
    /// Short overview.
    pub summary: String,
    /// How-to-use description.
    pub application: String,
    /// Contributing fragment ids, in source order.
    #[serde(default)]
    pub source_fragments: Vec<FragmentId>,
}

// ---------------------------------------------------------------------------
// ConsolidatedDocument
// ---------------------------------------------------------------------------

/// The consolidation engine's output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedDocument {
    /// Destination filename (renumbered per category by the emitter).
    pub filename: String,
    /// Human title.
    pub title: String,
    pub category: OutputCategory,
    /// Merged text content.
    pub content: String,
    /// Contributing fragment ids (provenance).
    pub source_fragments: Vec<FragmentId>,
    /// Contributing source-document names, sorted and unique.
    pub source_files: Vec<String>,
    /// Token length measured over `content`.
    pub total_tokens: usize,
    /// Keywords from the fixed vocabulary, at most 10.
    pub keywords: Vec<String>,
    pub has_duplicates_removed: bool,
    /// Removed duplicates whose surviving original is part of this document.
    pub duplicate_count: usize,
}

impl ConsolidatedDocument {
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
