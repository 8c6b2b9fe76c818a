//! Token measurement seam.
//!
//! The real tokenizer is an external collaborator; everything that sizes
//! documents goes through [`TokenCounter`] so a backend can be swapped in.

/// Measures the token length of a piece of text.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// Whitespace word count scaled by a fixed tokens-per-word ratio.
#[derive(Debug, Clone, Copy)]
pub struct WordEstimate {
    pub tokens_per_word: f64,
}

impl Default for WordEstimate {
    fn default() -> Self {
        Self {
            tokens_per_word: 1.3,
        }
    }
}

impl TokenCounter for WordEstimate {
    fn count(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words as f64 * self.tokens_per_word).ceil() as usize
    }
}
