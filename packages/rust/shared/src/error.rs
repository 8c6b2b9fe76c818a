//! Error types for knowledgepack.
//!
//! Library crates use [`KnowledgePackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all knowledgepack operations.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgePackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Fragment or framework input could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input violates the fragment/framework contract.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Consolidation was invoked without any fragments.
    #[error("empty input: {0}")]
    EmptyInput(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KnowledgePackError>;

impl KnowledgePackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KnowledgePackError::config("max_tokens must be positive");
        assert_eq!(err.to_string(), "config error: max_tokens must be positive");

        let err = KnowledgePackError::validation("record 4 has blank source");
        assert!(err.to_string().contains("record 4"));

        let err = KnowledgePackError::EmptyInput("no fragments to consolidate".into());
        assert_eq!(err.to_string(), "empty input: no fragments to consolidate");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = KnowledgePackError::io(
            "/tmp/fragments.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("fragments.json"));
    }
}
