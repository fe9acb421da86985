//! JSON snapshot persistence for the in-memory content store

use super::memory::InMemoryStore;
use crate::core::{MttError, Record, Result, Taxonomy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Content Snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SnapshotMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub saved_at: DateTime<Utc>,
    pub record_count: usize,
    pub taxonomy_count: usize,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl ContentSnapshot {
    pub fn from_store(store: &InMemoryStore) -> Self {
        let taxonomies: Vec<Taxonomy> = store.taxonomies().cloned().collect();
        let records: Vec<Record> = store.records().cloned().collect();
        let metadata = SnapshotMetadata {
            saved_at: Utc::now(),
            record_count: records.len(),
            taxonomy_count: taxonomies.len(),
        };

        Self {
            version: SNAPSHOT_VERSION,
            taxonomies,
            records,
            metadata: Some(metadata),
        }
    }

    pub fn into_store(self) -> Result<InMemoryStore> {
        if self.version > SNAPSHOT_VERSION {
            return Err(MttError::Storage(format!(
                "Snapshot version {} is newer than supported version {}",
                self.version, SNAPSHOT_VERSION
            )));
        }

        let mut store = InMemoryStore::new();
        for taxonomy in self.taxonomies {
            store.register_taxonomy(taxonomy);
        }
        for record in self.records {
            let id = record.id;
            if store.insert_record(record).is_some() {
                return Err(MttError::Storage(format!("Duplicate record id {} in snapshot", id)));
            }
        }
        Ok(store)
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
    pretty: bool,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            pretty: true,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    /// Write the snapshot through a temp file in the target directory, then
    /// rename it into place.
    pub fn save(&self, snapshot: &ContentSnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            MttError::Storage(format!("Failed to create snapshot directory: {}", e))
        })?;

        let serialized = if self.pretty {
            serde_json::to_vec_pretty(snapshot)?
        } else {
            serde_json::to_vec(snapshot)?
        };

        let mut temp = NamedTempFile::new_in(&parent)
            .map_err(|e| MttError::Storage(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| MttError::Storage(format!("Failed to write snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| MttError::Storage(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| MttError::Storage(format!("Failed to rename snapshot: {}", e.error)))?;

        debug!(path = %self.snapshot_path.display(), bytes = serialized.len(), "snapshot saved");
        Ok(())
    }

    /// `None` when no snapshot file exists yet
    pub fn load(&self) -> Result<Option<ContentSnapshot>> {
        if !self.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| MttError::Storage(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: ContentSnapshot = serde_json::from_slice(&data)?;
        Ok(Some(snapshot))
    }

    pub fn load_store(&self) -> Result<Option<InMemoryStore>> {
        self.load()?.map(ContentSnapshot::into_store).transpose()
    }

    pub fn save_store(&self, store: &InMemoryStore) -> Result<()> {
        self.save(&ContentSnapshot::from_store(store))
    }
}
