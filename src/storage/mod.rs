pub mod engine;
pub mod memory;
pub mod persistence;
pub mod query;

pub use engine::{ContentStore, MetadataStore, RecordQuery, TaxonomyResolver, TermAssigner};
pub use memory::InMemoryStore;
pub use persistence::{ContentSnapshot, SnapshotManager};
pub use query::{QueryArgs, RecordPage};
