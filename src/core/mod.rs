pub mod error;
pub mod types;
pub mod value;

pub use error::{MttError, Result};
pub use types::{MetaEntry, Record, RecordId, Taxonomy};
pub use value::MetaValue;
