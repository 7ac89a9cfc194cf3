//! CLI output formatting.
//!
//! Output is information-centric, not file-centric: each entity leads with
//! its identity (source image, candidate index, upload name) and shows
//! filesystem paths or failure reasons as indented context lines.
//!
//! ```text
//! poster.png
//!     Large  → out/poster_Large.jpg
//!     Medium → out/poster_Medium.jpg
//!     Small  → out/poster_Small.jpg
//! Exported 1 image, 4 files written
//! ```
//!
//! Each surface has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use std::path::Path;

use crate::export::ExportSummary;
use crate::store::CredentialRecord;
use crate::upload::{BatchReport, UploadOutcome};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Export
// ============================================================================

/// Format an export run: one block per source image, each written file as
/// an indented `→` line, then a totals line.
pub fn format_export_output(summary: &ExportSummary) -> Vec<String> {
    let mut lines = Vec::new();
    let per_source = if summary.sources.is_empty() {
        0
    } else {
        summary.written.len() / summary.sources.len()
    };

    for (i, source) in summary.sources.iter().enumerate() {
        lines.push(file_name(source));
        for written in summary.written.iter().skip(i * per_source).take(per_source) {
            lines.push(format!("    \u{2192} {}", written.display()));
        }
    }
    lines.push(format!(
        "Exported {} image(s), {} file(s) written",
        summary.sources.len(),
        summary.written.len()
    ));
    lines
}

pub fn print_export_output(summary: &ExportSummary) {
    for line in format_export_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Format a batch report: one line per item with its outcome as context,
/// then a totals line.
pub fn format_upload_output(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            UploadOutcome::Uploaded { name, file_id } => {
                lines.push(format!("{} {}", format_index(i + 1), name));
                lines.push(format!("    Uploaded: {}", file_id));
            }
            UploadOutcome::Failed { name, reason } => {
                lines.push(format!("{} {}", format_index(i + 1), name));
                lines.push(format!("    Failed: {}", reason));
            }
        }
    }
    lines.push(format!(
        "Uploaded {} of {}, {} failed",
        report.succeeded(),
        report.outcomes.len(),
        report.failed()
    ));
    lines
}

pub fn print_upload_output(report: &BatchReport) {
    for line in format_upload_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Brainstorm
// ============================================================================

/// Format brainstormed prompt candidates as a numbered list.
pub fn format_candidates(candidates: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), candidate));
    }
    lines.push(format!("{} candidate(s)", candidates.len()));
    lines
}

pub fn print_candidates(candidates: &[String]) {
    for line in format_candidates(candidates) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

/// Format the current-identity view.
pub fn format_status(record: Option<&CredentialRecord>) -> Vec<String> {
    match record {
        None => vec!["Not logged in".to_string()],
        Some(record) => {
            let mut lines = vec![format!("Logged in as {}", record.identity)];
            if let Some(name) = &record.name {
                lines.push(format!("    Name: {}", name));
            }
            lines.push(format!(
                "    Refresh token: {}",
                if record.refresh_token.is_some() {
                    "stored"
                } else {
                    "absent"
                }
            ));
            lines
        }
    }
}

pub fn print_status(record: Option<&CredentialRecord>) {
    for line in format_status(record) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Identity;
    use std::path::PathBuf;

    #[test]
    fn export_output_groups_files_under_their_source() {
        let summary = ExportSummary {
            sources: vec![PathBuf::from("in/poster.png")],
            written: vec![
                PathBuf::from("out/poster_Large.jpg"),
                PathBuf::from("out/poster.png"),
            ],
        };
        let lines = format_export_output(&summary);
        assert_eq!(lines[0], "poster.png");
        assert_eq!(lines[1], "    \u{2192} out/poster_Large.jpg");
        assert_eq!(lines[3], "Exported 1 image(s), 2 file(s) written");
    }

    #[test]
    fn upload_output_shows_outcome_per_item() {
        let report = BatchReport {
            outcomes: vec![
                UploadOutcome::Uploaded {
                    name: "a.jpg".to_string(),
                    file_id: "id-1".to_string(),
                },
                UploadOutcome::Failed {
                    name: "b.jpg".to_string(),
                    reason: "rejected".to_string(),
                },
            ],
        };
        let lines = format_upload_output(&report);
        assert_eq!(lines[0], "001 a.jpg");
        assert_eq!(lines[1], "    Uploaded: id-1");
        assert_eq!(lines[2], "002 b.jpg");
        assert_eq!(lines[3], "    Failed: rejected");
        assert_eq!(lines[4], "Uploaded 1 of 2, 1 failed");
    }

    #[test]
    fn candidates_are_numbered() {
        let lines = format_candidates(&["one".to_string(), "two".to_string()]);
        assert_eq!(lines, vec!["001 one", "002 two", "2 candidate(s)"]);
    }

    #[test]
    fn status_without_record_is_logged_out() {
        assert_eq!(format_status(None), vec!["Not logged in"]);
    }

    #[test]
    fn status_with_record_shows_identity_and_refresh_state() {
        let record = CredentialRecord {
            id: 1,
            identity: Identity::from("ada@example.com"),
            name: Some("Ada".to_string()),
            picture: None,
            access_token: "tok".to_string(),
            refresh_token: None,
        };
        let lines = format_status(Some(&record));
        assert_eq!(lines[0], "Logged in as ada@example.com");
        assert_eq!(lines[1], "    Name: Ada");
        assert_eq!(lines[2], "    Refresh token: absent");
    }
}
