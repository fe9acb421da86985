pub mod report;
pub mod runner;

pub use report::{
    FailureReason, LineWriter, MigrationObserver, MigrationReport, NoopObserver, OutcomeCounts,
    PageSummary, RecordOutcome, RecordReport,
};
pub use runner::{MigrationRequest, migrate, migrate_with};
