// ============================================================================
// metaterm: metadata-to-taxonomy migration
// ============================================================================

//! Move values stored under a metadata key into taxonomy term assignments,
//! deleting the metadata once its terms are attached.
//!
//! ```
//! use metaterm::{InMemoryStore, MigrationRequest, Record, RecordOutcome, Taxonomy, migrate};
//!
//! # fn main() -> metaterm::Result<()> {
//! let mut store = InMemoryStore::new()
//!     .with_taxonomy(Taxonomy::new("colors", ["post"]))
//!     .with_record(Record::new(10, "post").with_meta("color", "red").with_meta("color", "blue"))
//!     .with_record(Record::new(11, "post"));
//!
//! let report = migrate(&mut store, &MigrationRequest::new("color", "colors"))?;
//!
//! assert_eq!(report.outcome(11), Some(&RecordOutcome::Skipped));
//! assert_eq!(store.record(10).unwrap().terms("colors"), ["red", "blue"]);
//! assert!(!store.record(10).unwrap().has_meta("color"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod logging;
pub mod migration;
pub mod storage;

// Re-export main types for convenience
pub use config::{ColorChoice, OutputFormat, RunConfig};
pub use core::{MetaEntry, MetaValue, MttError, Record, RecordId, Result, Taxonomy};
pub use migration::{
    MigrationObserver, MigrationReport, MigrationRequest, RecordOutcome, RecordReport, migrate,
    migrate_with,
};
pub use storage::{
    ContentStore, InMemoryStore, MetadataStore, QueryArgs, RecordPage, RecordQuery,
    SnapshotManager, TaxonomyResolver, TermAssigner,
};
