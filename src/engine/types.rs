//! Engine types
//!
//! Per-entity outcomes and run statistics.

use serde::Serialize;

/// Result of processing one seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A record was written with this many reviews
    Written { reviews: usize },
    /// The entity failed and nothing was written
    Failed,
}

/// Statistics from a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Seeds after rental list expansion
    pub seeds: usize,
    /// Records written
    pub records_written: usize,
    /// Entities that failed
    pub entities_failed: usize,
    /// Reviews across all written records
    pub reviews_collected: usize,
    /// Placeholders written by the delta check
    pub placeholders_written: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entity outcome into the totals
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Written { reviews } => {
                self.records_written += 1;
                self.reviews_collected += reviews;
            }
            Outcome::Failed => self.entities_failed += 1,
        }
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
