use crate::core::{MttError, RecordId, Result, Taxonomy};
use serde::Serialize;
use std::collections::BTreeMap;

pub const OBJECT_TYPE: &str = "object_type";
pub const PAGE_SIZE: &str = "page_size";
pub const PAGE: &str = "page";
pub const STATUS: &str = "status";

/// Wildcard accepted by `object_type` and `status`
pub const ANY: &str = "any";

/// Page size meaning "every matching record"
pub const UNLIMITED: &str = "-1";

const ALIASES: &[(&str, &str)] = &[
    ("post_type", OBJECT_TYPE),
    ("posts_per_page", PAGE_SIZE),
    ("paged", PAGE),
    ("post_status", STATUS),
];

/// Map an accepted alias onto its canonical key; other keys pass unchanged.
pub fn canonical_key(key: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Filter set handed to a [`RecordQuery`](super::RecordQuery).
///
/// Values stay strings until a typed accessor reads them, so keys the runner
/// does not know about reach the collaborator untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryArgs {
    args: BTreeMap<String, String>,
}

impl QueryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for a migration into `taxonomy`: its object types, every
    /// record on one page, any visible status.
    pub fn defaults_for(taxonomy: &Taxonomy) -> Self {
        Self::new()
            .with(OBJECT_TYPE, taxonomy.object_types.join(","))
            .with(PAGE_SIZE, UNLIMITED)
            .with(STATUS, ANY)
    }

    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = canonical_key(key.as_ref()).to_string();
        self.args.insert(key, value.into());
    }

    /// Overlay caller filters, key by key.
    pub fn merge<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in overrides {
            self.set(key, value.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(canonical_key(key)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys outside the canonical four
    pub fn extra(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter(|(k, _)| ![OBJECT_TYPE, PAGE_SIZE, PAGE, STATUS].contains(k))
    }

    /// Requested object types. `None` means any type; an empty list (a
    /// taxonomy attached to nothing) matches no record.
    pub fn object_types(&self) -> Option<Vec<String>> {
        let raw = self.get(OBJECT_TYPE)?;
        let types = split_list(raw);
        if types.iter().any(|t| t == ANY) {
            None
        } else {
            Some(types)
        }
    }

    /// Requested statuses. `None` means the `any` wildcard.
    pub fn statuses(&self) -> Option<Vec<String>> {
        let raw = self.get(STATUS)?;
        let statuses = split_list(raw);
        if statuses.is_empty() || statuses.iter().any(|s| s == ANY) {
            None
        } else {
            Some(statuses)
        }
    }

    /// Page size, `None` for unlimited (`-1` or absent).
    pub fn page_size(&self) -> Result<Option<usize>> {
        let Some(raw) = self.get(PAGE_SIZE) else {
            return Ok(None);
        };
        let size: i64 = raw.trim().parse().map_err(|_| {
            MttError::Query(format!("'{}' must be an integer, got '{}'", PAGE_SIZE, raw))
        })?;
        match size {
            -1 => Ok(None),
            n if n > 0 => Ok(Some(n as usize)),
            _ => Err(MttError::Query(format!(
                "'{}' must be -1 or a positive integer, got {}",
                PAGE_SIZE, size
            ))),
        }
    }

    /// One-based page number, 1 when unspecified.
    pub fn page(&self) -> Result<usize> {
        let Some(raw) = self.get(PAGE) else {
            return Ok(1);
        };
        match raw.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(MttError::Query(format!(
                "'{}' must be a positive integer, got '{}'",
                PAGE, raw
            ))),
            Ok(page) => Ok(page),
        }
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One explicitly requested page of query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPage {
    pub total_pages: usize,
    pub current_page: usize,
    pub records: Vec<RecordId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_for_taxonomy() {
        let taxonomy = Taxonomy::new("colors", ["post", "product"]);
        let args = QueryArgs::defaults_for(&taxonomy);

        assert_eq!(args.get(OBJECT_TYPE), Some("post,product"));
        assert_eq!(
            args.object_types(),
            Some(vec!["post".to_string(), "product".to_string()])
        );
        assert_eq!(args.page_size().unwrap(), None);
        assert_eq!(args.page().unwrap(), 1);
        assert_eq!(args.statuses(), None);
    }

    #[test]
    fn test_merge_overrides_per_key_and_normalizes_aliases() {
        let taxonomy = Taxonomy::new("colors", ["post"]);
        let overrides = caller(&[("posts_per_page", "200"), ("paged", "2"), ("orderby", "title")]);
        let args = QueryArgs::defaults_for(&taxonomy).merge(&overrides);

        assert_eq!(args.page_size().unwrap(), Some(200));
        assert_eq!(args.page().unwrap(), 2);
        assert_eq!(args.get("posts_per_page"), Some("200"));
        assert_eq!(args.get(OBJECT_TYPE), Some("post"));
        assert_eq!(args.extra().collect::<Vec<_>>(), vec![("orderby", "title")]);
    }

    #[test]
    fn test_wildcards() {
        let args = QueryArgs::new()
            .with("post_type", "any")
            .with("post_status", "draft, publish");
        assert_eq!(args.object_types(), None);
        assert_eq!(
            args.statuses(),
            Some(vec!["draft".to_string(), "publish".to_string()])
        );
    }

    #[test]
    fn test_taxonomy_without_object_types_selects_nothing() {
        let args = QueryArgs::defaults_for(&Taxonomy::new("orphans", Vec::<String>::new()));
        assert_eq!(args.get(OBJECT_TYPE), Some(""));
        assert_eq!(args.object_types(), Some(Vec::new()));
    }

    #[test]
    fn test_malformed_values_are_query_errors() {
        assert!(matches!(
            QueryArgs::new().with(PAGE_SIZE, "lots").page_size(),
            Err(MttError::Query(_))
        ));
        assert!(QueryArgs::new().with(PAGE_SIZE, "0").page_size().is_err());
        assert!(QueryArgs::new().with(PAGE_SIZE, "-5").page_size().is_err());
        assert!(QueryArgs::new().with(PAGE, "0").page().is_err());
        assert!(QueryArgs::new().with(PAGE, "two").page().is_err());
    }
}
