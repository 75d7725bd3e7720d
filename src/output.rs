//! CLI output formatting for a run.
//!
//! # Information-First Display
//!
//! Each notebook is listed by positional index and stem with its outcome;
//! details (error text) follow as indented context lines. The archive,
//! index, and totals come after the notebook list.
//!
//! ```text
//! Notebooks
//! 001 Analysis → converted
//! 002 Scratch → up to date
//! 003 Template → ignored
//! 004 Broken → failed
//!     Error: converter exited with status 1: bad notebook
//!
//! Archive → archives
//!     Analysis.html (replaced)
//!
//! Index → archives/index.html
//!     Stylesheet: present
//!
//! 1 converted, 1 reused, 1 skipped, 1 failed
//! ```
//!
//! # Architecture
//!
//! [`format_run_summary`] is pure (returns `Vec<String>`) for testability;
//! [`print_run_summary`] writes it to stdout.

use crate::pipeline::{AssetStatus, IndexStatus, RunReport};
use crate::scan::page_filename;
use crate::types::FileOutcome;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format the end-of-run summary.
pub fn format_run_summary(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.documents.is_empty() {
        lines.push("Nothing to do: no notebooks found".to_string());
    } else {
        lines.push("Notebooks".to_string());
        for (i, doc) in report.documents.iter().enumerate() {
            lines.push(format!(
                "{} {} \u{2192} {}",
                format_index(i + 1),
                doc.stem,
                doc.outcome.label()
            ));
            if let FileOutcome::Failed(error) = &doc.outcome {
                lines.push(format!("{}Error: {}", indent(1), error));
            }
        }
    }

    let placement = &report.placement;
    if !placement.placed.is_empty() || !placement.failed.is_empty() {
        lines.push(String::new());
        lines.push(format!("Archive \u{2192} {}", report.archive_dir.display()));
        for stem in &placement.placed {
            let replaced = placement.replaced.contains(stem);
            lines.push(format!(
                "{}{}{}",
                indent(1),
                page_filename(stem),
                if replaced { " (replaced)" } else { "" }
            ));
        }
        for (stem, error) in &placement.failed {
            lines.push(format!(
                "{}{} not placed: {}",
                indent(1),
                page_filename(stem),
                error
            ));
        }
    }

    match &report.index {
        IndexStatus::NotRequested => {}
        IndexStatus::Written { path } => {
            lines.push(String::new());
            lines.push(format!("Index \u{2192} {}", path.display()));
        }
        IndexStatus::Failed { error } => {
            lines.push(String::new());
            lines.push(format!("Index not written: {}", error));
        }
    }
    if let Some(asset) = &report.stylesheet {
        let status = match asset {
            AssetStatus::Present => "present".to_string(),
            AssetStatus::Fetched => "fetched".to_string(),
            AssetStatus::Failed { error } => format!("unavailable ({})", error),
        };
        lines.push(format!("{}Stylesheet: {}", indent(1), status));
    }

    if !report.documents.is_empty() {
        lines.push(String::new());
        lines.push(format_totals(report));
    }
    lines
}

/// `N converted, N reused, N skipped, N failed`
fn format_totals(report: &RunReport) -> String {
    let converted = report.count(|o| matches!(o, FileOutcome::Converted));
    let reused = report.count(|o| matches!(o, FileOutcome::Existing | FileOutcome::Cached));
    let skipped = report.count(|o| matches!(o, FileOutcome::Ignored | FileOutcome::Missing));
    let failed = report.count(|o| matches!(o, FileOutcome::Failed(_)))
        + report.placement.failed.len();
    format!(
        "{} converted, {} reused, {} skipped, {} failed",
        converted, reused, skipped, failed
    )
}

/// Print the end-of-run summary to stdout.
pub fn print_run_summary(report: &RunReport) {
    for line in format_run_summary(report) {
        println!("{}", line);
    }
}
