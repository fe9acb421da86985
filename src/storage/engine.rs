use super::query::{QueryArgs, RecordPage};
use crate::core::{MetaValue, RecordId, Result, Taxonomy};

/// Looks taxonomies up by slug
pub trait TaxonomyResolver {
    fn resolve_taxonomy(&self, slug: &str) -> Result<Option<Taxonomy>>;
}

/// Runs a filtered query and returns exactly one page of record ids
pub trait RecordQuery {
    fn query(&self, args: &QueryArgs) -> Result<RecordPage>;
}

/// Per-record metadata access
pub trait MetadataStore {
    /// All values under `key`, in stored order. Empty when the record has none.
    fn meta_values(&self, id: RecordId, key: &str) -> Result<Vec<MetaValue>>;

    /// Remove every entry under `key`, returning how many were removed.
    fn delete_meta(&mut self, id: RecordId, key: &str) -> Result<usize>;
}

/// Term assignment for records
pub trait TermAssigner {
    /// Attach `terms` to the record in `taxonomy`.
    ///
    /// With `append` the record keeps its existing terms; otherwise they are
    /// replaced. Either every term is attached or the call fails without
    /// changing the record. Returns the terms that were not attached before.
    fn attach_terms(
        &mut self,
        id: RecordId,
        taxonomy: &str,
        terms: &[String],
        append: bool,
    ) -> Result<Vec<String>>;

    /// Remove `terms` from the record in `taxonomy`. Missing terms are ignored.
    fn detach_terms(&mut self, id: RecordId, taxonomy: &str, terms: &[String]) -> Result<()>;
}

/// Everything a migration needs from a content store
pub trait ContentStore: TaxonomyResolver + RecordQuery + MetadataStore + TermAssigner {}

impl<T> ContentStore for T where T: ?Sized + TaxonomyResolver + RecordQuery + MetadataStore + TermAssigner {}
