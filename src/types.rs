//! Shared per-document outcome types.
//!
//! Produced by the orchestrator, consumed by the run summary printer.

use serde::Serialize;

/// What happened to one discovered notebook during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Listed in the effective ignore set; no side effects.
    Ignored,
    /// Converted and wrapped this run.
    Converted,
    /// Output already present in the working directory; conversion skipped.
    Existing,
    /// Archived page matches the current source; nothing to do.
    Cached,
    /// Source vanished between discovery and processing.
    Missing,
    /// Conversion failed; excluded from placement and the index.
    Failed(String),
}

impl FileOutcome {
    /// Whether a page for this document should be moved into the archive.
    pub fn needs_placement(&self) -> bool {
        matches!(self, FileOutcome::Converted | FileOutcome::Existing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Ignored => "ignored",
            FileOutcome::Converted => "converted",
            FileOutcome::Existing => "existing output",
            FileOutcome::Cached => "up to date",
            FileOutcome::Missing => "missing",
            FileOutcome::Failed(_) => "failed",
        }
    }
}
