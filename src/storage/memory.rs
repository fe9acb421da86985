use super::engine::{MetadataStore, RecordQuery, TaxonomyResolver, TermAssigner};
use super::query::{QueryArgs, RecordPage, split_list};
use crate::core::{MetaValue, MttError, Record, RecordId, Result, Taxonomy};
use std::collections::BTreeMap;
use tracing::debug;

/// Pass-through query keys this store interprets
const INCLUDE: &str = "include";
const META_KEY: &str = "meta_key";
const ORDER: &str = "order";

/// Content store held entirely in memory.
///
/// Records iterate in ascending id order unless a query asks for `order=desc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryStore {
    taxonomies: BTreeMap<String, Taxonomy>,
    records: BTreeMap<RecordId, Record>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.register_taxonomy(taxonomy);
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.insert_record(record);
        self
    }

    /// Register or replace a taxonomy
    pub fn register_taxonomy(&mut self, taxonomy: Taxonomy) {
        self.taxonomies.insert(taxonomy.slug.clone(), taxonomy);
    }

    /// Insert a record, replacing any record with the same id
    pub fn insert_record(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.id, record)
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn taxonomies(&self) -> impl Iterator<Item = &Taxonomy> {
        self.taxonomies.values()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn record_mut(&mut self, id: RecordId) -> Result<&mut Record> {
        self.records.get_mut(&id).ok_or(MttError::RecordNotFound(id))
    }

    fn matching(&self, args: &QueryArgs) -> Result<Vec<RecordId>> {
        let object_types = args.object_types();
        let statuses = args.statuses();
        let include = args
            .get(INCLUDE)
            .map(|raw| {
                split_list(raw)
                    .iter()
                    .map(|id| {
                        id.parse::<RecordId>().map_err(|_| {
                            MttError::Query(format!("'{}' expects record ids, got '{}'", INCLUDE, id))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        let meta_key = args.get(META_KEY);
        let descending = match args.get(ORDER).map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(other) => {
                return Err(MttError::Query(format!(
                    "'{}' must be 'asc' or 'desc', got '{}'",
                    ORDER, other
                )));
            }
        };

        for (key, value) in args.extra() {
            if ![INCLUDE, META_KEY, ORDER].contains(&key) {
                debug!(key, value, "ignoring unsupported query argument");
            }
        }

        let mut ids: Vec<RecordId> = self
            .records
            .values()
            .filter(|record| match &object_types {
                Some(types) => types.iter().any(|t| *t == record.object_type),
                None => true,
            })
            .filter(|record| match &statuses {
                Some(statuses) => statuses.iter().any(|s| *s == record.status),
                None => !record.is_hidden(),
            })
            .filter(|record| match &include {
                Some(ids) => ids.contains(&record.id),
                None => true,
            })
            .filter(|record| meta_key.is_none_or(|key| record.has_meta(key)))
            .map(|record| record.id)
            .collect();

        if descending {
            ids.reverse();
        }
        Ok(ids)
    }
}

impl TaxonomyResolver for InMemoryStore {
    fn resolve_taxonomy(&self, slug: &str) -> Result<Option<Taxonomy>> {
        Ok(self.taxonomies.get(slug).cloned())
    }
}

impl RecordQuery for InMemoryStore {
    fn query(&self, args: &QueryArgs) -> Result<RecordPage> {
        let page = args.page()?;
        let page_size = args.page_size()?;
        let ids = self.matching(args)?;

        let Some(size) = page_size else {
            // Unlimited: everything lands on the first page.
            let total_pages = usize::from(!ids.is_empty());
            let records = if page == 1 { ids } else { Vec::new() };
            return Ok(RecordPage {
                total_pages,
                current_page: page,
                records,
            });
        };

        let total_pages = ids.len().div_ceil(size);
        // An offset past usize::MAX is past the end as well.
        let records = match (page - 1).checked_mul(size) {
            Some(offset) => ids.into_iter().skip(offset).take(size).collect(),
            None => Vec::new(),
        };
        Ok(RecordPage {
            total_pages,
            current_page: page,
            records,
        })
    }
}

impl MetadataStore for InMemoryStore {
    fn meta_values(&self, id: RecordId, key: &str) -> Result<Vec<MetaValue>> {
        self.records
            .get(&id)
            .map(|record| record.meta_values(key))
            .ok_or(MttError::RecordNotFound(id))
    }

    fn delete_meta(&mut self, id: RecordId, key: &str) -> Result<usize> {
        let record = self.record_mut(id)?;
        let before = record.meta.len();
        record.meta.retain(|entry| entry.key != key);
        Ok(before - record.meta.len())
    }
}

impl TermAssigner for InMemoryStore {
    fn attach_terms(
        &mut self,
        id: RecordId,
        taxonomy: &str,
        terms: &[String],
        append: bool,
    ) -> Result<Vec<String>> {
        if !self.taxonomies.contains_key(taxonomy) {
            return Err(MttError::InvalidTaxonomy(taxonomy.to_string()));
        }

        // Validate everything before touching the record.
        let mut names: Vec<String> = Vec::with_capacity(terms.len());
        for term in terms {
            let name = term.trim();
            if name.is_empty() {
                return Err(MttError::InvalidTerm(format!(
                    "empty term name for record {}",
                    id
                )));
            }
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }

        let record = self.record_mut(id)?;
        let assigned = record.terms.entry(taxonomy.to_string()).or_default();
        if !append {
            assigned.clear();
        }

        let mut added = Vec::new();
        for name in names {
            if !assigned.contains(&name) {
                assigned.push(name.clone());
                added.push(name);
            }
        }
        Ok(added)
    }

    fn detach_terms(&mut self, id: RecordId, taxonomy: &str, terms: &[String]) -> Result<()> {
        let record = self.record_mut(id)?;
        if let Some(assigned) = record.terms.get_mut(taxonomy) {
            assigned.retain(|term| !terms.contains(term));
            if assigned.is_empty() {
                record.terms.remove(taxonomy);
            }
        }
        Ok(())
    }
}
