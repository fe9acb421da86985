use crate::core::RecordId;
use chrono::{DateTime, Utc};
use crossterm::style::{StyledContent, Stylize, style};
use serde::Serialize;
use std::fmt;

/// Why a record could not be migrated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The term attach call reported an error; nothing was changed.
    CouldNotSetTerms { error: String },
    /// Metadata deletion failed after attaching; the new terms were removed again.
    CouldNotDeleteMeta { error: String },
    /// Metadata deletion failed and removing the new terms failed too.
    RollbackFailed { error: String, rollback_error: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::CouldNotSetTerms { .. } => write!(f, "Could not set terms for record"),
            FailureReason::CouldNotDeleteMeta { .. } => {
                write!(f, "Could not delete meta, terms rolled back")
            }
            FailureReason::RollbackFailed { .. } => {
                write!(f, "Could not delete meta and could not roll back terms")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Skipped,
    Migrated { values: Vec<String> },
    WouldMigrate { values: Vec<String> },
    Failed { reason: FailureReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub id: RecordId,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

impl RecordReport {
    pub fn new(id: RecordId, outcome: RecordOutcome) -> Self {
        Self { id, outcome }
    }

    /// One status line; the bracketed id is coloured by outcome when `color`
    /// is set.
    pub fn render(&self, color: bool) -> String {
        let tag = format!("[{}]", self.id);
        let (tag, message) = match &self.outcome {
            RecordOutcome::Skipped => (paint(tag, color, |t| t.cyan()), "No meta, skipped".to_string()),
            RecordOutcome::Migrated { values } => (
                paint(tag, color, |t| t.green()),
                format!("Migrated: {}", values.join(", ")),
            ),
            RecordOutcome::WouldMigrate { values } => (
                paint(tag, color, |t| t.yellow()),
                format!("Would migrate: {}", values.join(", ")),
            ),
            RecordOutcome::Failed { reason } => {
                (paint(tag, color, |t| t.red()), format!("Error: {}", reason))
            }
        };
        format!("{} {}", tag, message)
    }
}

fn paint<F>(text: String, color: bool, colorize: F) -> String
where
    F: FnOnce(StyledContent<String>) -> StyledContent<String>,
{
    if color {
        colorize(style(text)).to_string()
    } else {
        text
    }
}

/// Paging figures printed ahead of the record lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// `None` when every matching record is on one page
    pub page_size: Option<usize>,
    pub page: usize,
    pub total_pages: usize,
}

impl PageSummary {
    pub fn render(&self) -> String {
        let per_page = self
            .page_size
            .map(|size| size.to_string())
            .unwrap_or_else(|| "-1".to_string());
        format!(
            "---\nPer page: {} \nPage: {} \nTotal pages: {}\n---",
            per_page, self.page, self.total_pages
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of one `migrate` invocation over a single page
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub meta_key: String,
    pub taxonomy: String,
    pub dry_run: bool,
    pub summary: PageSummary,
    pub records: Vec<RecordReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for record in &self.records {
            match record.outcome {
                RecordOutcome::Skipped => counts.skipped += 1,
                RecordOutcome::Migrated { .. } | RecordOutcome::WouldMigrate { .. } => {
                    counts.migrated += 1
                }
                RecordOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    pub fn outcome(&self, id: RecordId) -> Option<&RecordOutcome> {
        self.records
            .iter()
            .find(|record| record.id == id)
            .map(|record| &record.outcome)
    }
}

/// Receives progress while a migration runs
pub trait MigrationObserver {
    fn on_summary(&mut self, _summary: &PageSummary) {}

    fn on_record(&mut self, _record: &RecordReport) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}

/// Writes the summary block and one line per record as they arrive
pub struct LineWriter<W: std::io::Write> {
    out: W,
    color: bool,
}

impl<W: std::io::Write> LineWriter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        // A closed stdout must not abort a half-finished migration.
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }
}

impl<W: std::io::Write> MigrationObserver for LineWriter<W> {
    fn on_summary(&mut self, summary: &PageSummary) {
        self.write_line(&summary.render());
    }

    fn on_record(&mut self, record: &RecordReport) {
        let line = record.render(self.color);
        self.write_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated(id: RecordId, values: &[&str]) -> RecordReport {
        RecordReport::new(
            id,
            RecordOutcome::Migrated {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    #[test]
    fn test_plain_lines() {
        assert_eq!(migrated(10, &["red", "blue"]).render(false), "[10] Migrated: red, blue");
        assert_eq!(
            RecordReport::new(11, RecordOutcome::Skipped).render(false),
            "[11] No meta, skipped"
        );
        let failed = RecordReport::new(
            12,
            RecordOutcome::Failed {
                reason: FailureReason::CouldNotSetTerms {
                    error: "Invalid term: empty".to_string(),
                },
            },
        );
        assert_eq!(failed.render(false), "[12] Error: Could not set terms for record");
    }

    #[test]
    fn test_coloured_lines_keep_message() {
        let line = migrated(10, &["red"]).render(true);
        assert!(line.contains("[10]"));
        assert!(line.ends_with(" Migrated: red"));
    }

    #[test]
    fn test_summary_block() {
        let unlimited = PageSummary {
            page_size: None,
            page: 1,
            total_pages: 1,
        };
        assert_eq!(unlimited.render(), "---\nPer page: -1 \nPage: 1 \nTotal pages: 1\n---");

        let paged = PageSummary {
            page_size: Some(200),
            page: 2,
            total_pages: 3,
        };
        assert!(paged.render().contains("Per page: 200 \nPage: 2 \nTotal pages: 3"));
    }

    #[test]
    fn test_line_writer_streams() {
        let mut writer = LineWriter::new(Vec::new(), false);
        writer.on_summary(&PageSummary {
            page_size: None,
            page: 1,
            total_pages: 1,
        });
        writer.on_record(&RecordReport::new(3, RecordOutcome::Skipped));

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.starts_with("---\nPer page: -1"));
        assert!(output.ends_with("[3] No meta, skipped\n"));
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(migrated(10, &["red"])).unwrap();
        assert_eq!(json["id"], 10);
        assert_eq!(json["status"], "migrated");
        assert_eq!(json["values"][0], "red");

        let skipped = serde_json::to_value(RecordReport::new(11, RecordOutcome::Skipped)).unwrap();
        assert_eq!(skipped["status"], "skipped");
    }
}
