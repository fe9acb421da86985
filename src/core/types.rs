use super::MetaValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type RecordId = u64;

/// Statuses a wildcard `any` status filter never matches
pub const HIDDEN_STATUSES: &[&str] = &["trash", "auto-draft"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: MetaValue,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A unit of content: typed, with a publication status, metadata entries
/// and per-taxonomy term lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub object_type: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub meta: Vec<MetaEntry>,
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<String>>,
}

fn default_status() -> String {
    "publish".to_string()
}

impl Record {
    pub fn new(id: RecordId, object_type: impl Into<String>) -> Self {
        Self {
            id,
            object_type: object_type.into(),
            status: default_status(),
            meta: Vec::new(),
            terms: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Append a metadata entry. Repeated keys are kept in insertion order.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.meta.push(MetaEntry::new(key, value));
        self
    }

    pub fn with_terms<I, T>(mut self, taxonomy: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.terms
            .entry(taxonomy.into())
            .or_default()
            .extend(terms.into_iter().map(Into::into));
        self
    }

    pub fn meta_values(&self, key: &str) -> Vec<MetaValue> {
        self.meta
            .iter()
            .filter(|entry| entry.key == key)
            .map(|entry| entry.value.clone())
            .collect()
    }

    pub fn has_meta(&self, key: &str) -> bool {
        self.meta.iter().any(|entry| entry.key == key)
    }

    pub fn terms(&self, taxonomy: &str) -> &[String] {
        self.terms.get(taxonomy).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_hidden(&self) -> bool {
        HIDDEN_STATUSES.contains(&self.status.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub slug: String,
    /// Record types this taxonomy attaches to
    pub object_types: Vec<String>,
}

impl Taxonomy {
    pub fn new<I, T>(slug: impl Into<String>, object_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            slug: slug.into(),
            object_types: object_types.into_iter().map(Into::into).collect(),
        }
    }
}
