//! Content preservation accounting.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use knowledgepack_shared::{ConsolidatedDocument, Fragment, OutputCategory};

/// Preservation rate below which a run is flagged.
pub const PRESERVATION_WARN_THRESHOLD: f64 = 0.95;

/// Character mass in vs. out for one run.
#[derive(Debug, Clone, Default)]
pub struct ContentTracker {
    input_chars: usize,
    output_chars: Option<usize>,
}

/// Serializable outcome of [`ContentTracker::verify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreservationReport {
    pub input_chars: usize,
    pub output_chars: usize,
    /// `None` when the input carried no characters.
    pub preservation_rate: Option<f64>,
    pub warning: Option<String>,
}

impl ContentTracker {
    /// Record the intake mass, before deduplication.
    pub fn track_input(fragments: &[Fragment]) -> Self {
        Self {
            input_chars: fragments.iter().map(Fragment::char_count).sum(),
            output_chars: None,
        }
    }

    pub fn input_chars(&self) -> usize {
        self.input_chars
    }

    /// Measure the final documents against the recorded intake mass.
    pub fn verify(
        &mut self,
        documents: &BTreeMap<OutputCategory, Vec<ConsolidatedDocument>>,
    ) -> PreservationReport {
        let output_chars: usize = documents
            .values()
            .flatten()
            .map(ConsolidatedDocument::char_count)
            .sum();
        self.output_chars = Some(output_chars);

        let rate = self.preservation_rate();
        let warning = rate
            .filter(|r| *r < PRESERVATION_WARN_THRESHOLD)
            .map(|r| format!("content preservation {:.1}% is below {:.0}%", r * 100.0, PRESERVATION_WARN_THRESHOLD * 100.0));

        match &warning {
            Some(message) => warn!(input = self.input_chars, output = output_chars, "{message}"),
            None => info!(input = self.input_chars, output = output_chars, rate = ?rate, "content preserved"),
        }

        PreservationReport {
            input_chars: self.input_chars,
            output_chars,
            preservation_rate: rate,
            warning,
        }
    }

    /// Output mass over input mass, once [`ContentTracker::verify`] has run.
    pub fn preservation_rate(&self) -> Option<f64> {
        let output = self.output_chars?;
        if self.input_chars == 0 {
            return None;
        }
        Some(output as f64 / self.input_chars as f64)
    }
}
