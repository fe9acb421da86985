use thiserror::Error;

use super::types::RecordId;

#[derive(Error, Debug)]
pub enum MttError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Record {0} not found")]
    RecordNotFound(RecordId),

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MttError {
    pub fn missing_taxonomy(slug: &str) -> Self {
        Self::Configuration(format!("The taxonomy '{}' doesn't exist", slug))
    }

    /// Errors that stop a run, as opposed to the per-record attach failures
    /// the runner absorbs.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, MttError>;
