use super::report::{
    FailureReason, MigrationObserver, MigrationReport, NoopObserver, PageSummary, RecordOutcome,
    RecordReport,
};
use crate::core::{MttError, RecordId, Result, Taxonomy};
use crate::storage::{ContentStore, QueryArgs};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, error, info, info_span, warn};

/// What to migrate and where to.
///
/// # Examples
///
/// ```
/// use metaterm::migration::MigrationRequest;
///
/// let request = MigrationRequest::new("color", "colors")
///     .filter("posts_per_page", "200")
///     .filter("paged", "2");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationRequest {
    pub meta_key: String,
    pub taxonomy: String,
    /// Caller filters, merged over the query defaults key by key
    pub filters: BTreeMap<String, String>,
    pub dry_run: bool,
}

impl MigrationRequest {
    pub fn new(meta_key: impl Into<String>, taxonomy: impl Into<String>) -> Self {
        Self {
            meta_key: meta_key.into(),
            taxonomy: taxonomy.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn filters<I, K, V>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.filters
            .extend(filters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.meta_key.trim().is_empty() {
            return Err(MttError::Configuration("Meta key cannot be empty".to_string()));
        }
        if self.taxonomy.trim().is_empty() {
            return Err(MttError::Configuration("Taxonomy slug cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Migrate one page of records, discarding progress notifications.
pub fn migrate<S>(store: &mut S, request: &MigrationRequest) -> Result<MigrationReport>
where
    S: ContentStore + ?Sized,
{
    migrate_with(store, request, &mut NoopObserver)
}

/// Migrate one page of records, reporting the summary and each record
/// outcome to `observer` as soon as it is known.
///
/// Fails before touching any record when the request is invalid or the
/// taxonomy does not resolve. Query errors are fatal. A record whose terms
/// cannot be attached is reported as failed and the loop moves on.
pub fn migrate_with<S, O>(
    store: &mut S,
    request: &MigrationRequest,
    observer: &mut O,
) -> Result<MigrationReport>
where
    S: ContentStore + ?Sized,
    O: MigrationObserver + ?Sized,
{
    request.validate()?;

    let span = info_span!(
        "migrate",
        meta_key = %request.meta_key,
        taxonomy = %request.taxonomy,
        dry_run = request.dry_run
    );
    let _enter = span.enter();
    let started_at = Utc::now();

    let taxonomy = store
        .resolve_taxonomy(&request.taxonomy)?
        .ok_or_else(|| MttError::missing_taxonomy(&request.taxonomy))?;

    let args = QueryArgs::defaults_for(&taxonomy).merge(&request.filters);
    let page_size = args.page_size()?;
    let page = store.query(&args)?;

    let summary = PageSummary {
        page_size,
        page: page.current_page,
        total_pages: page.total_pages,
    };
    info!(
        page = summary.page,
        total_pages = summary.total_pages,
        records = page.records.len(),
        "query returned page"
    );
    observer.on_summary(&summary);

    let mut records = Vec::with_capacity(page.records.len());
    for id in page.records {
        let outcome = migrate_record(store, id, &taxonomy, request)?;
        let report = RecordReport::new(id, outcome);
        observer.on_record(&report);
        records.push(report);
    }

    let report = MigrationReport {
        meta_key: request.meta_key.clone(),
        taxonomy: taxonomy.slug,
        dry_run: request.dry_run,
        summary,
        records,
        started_at,
        finished_at: Utc::now(),
    };
    let counts = report.counts();
    info!(
        migrated = counts.migrated,
        skipped = counts.skipped,
        failed = counts.failed,
        "migration finished"
    );
    Ok(report)
}

/// Attach-then-delete for a single record. A failure at either step leaves
/// the record as it was, unless the rollback of newly attached terms fails too.
fn migrate_record<S>(
    store: &mut S,
    id: RecordId,
    taxonomy: &Taxonomy,
    request: &MigrationRequest,
) -> Result<RecordOutcome>
where
    S: ContentStore + ?Sized,
{
    let values = store.meta_values(id, &request.meta_key)?;
    if values.is_empty() {
        debug!(record = id, "no meta, skipped");
        return Ok(RecordOutcome::Skipped);
    }

    let terms = match values
        .iter()
        .map(|value| value.term_name())
        .collect::<Option<Vec<String>>>()
    {
        Some(terms) => terms,
        None => {
            let error = MttError::InvalidTerm(format!("blank value under '{}'", request.meta_key));
            warn!(record = id, %error, "could not set terms");
            return Ok(RecordOutcome::Failed {
                reason: FailureReason::CouldNotSetTerms {
                    error: error.to_string(),
                },
            });
        }
    };

    if request.dry_run {
        debug!(record = id, terms = ?terms, "would migrate");
        return Ok(RecordOutcome::WouldMigrate { values: terms });
    }

    let added = match store.attach_terms(id, &taxonomy.slug, &terms, true) {
        Ok(added) => added,
        Err(error) => {
            warn!(record = id, %error, "could not set terms");
            return Ok(RecordOutcome::Failed {
                reason: FailureReason::CouldNotSetTerms {
                    error: error.to_string(),
                },
            });
        }
    };

    match store.delete_meta(id, &request.meta_key) {
        Ok(removed) => {
            info!(record = id, removed, added = added.len(), "migrated");
            Ok(RecordOutcome::Migrated { values: terms })
        }
        Err(error) => match store.detach_terms(id, &taxonomy.slug, &added) {
            Ok(()) => {
                warn!(record = id, %error, "could not delete meta, terms rolled back");
                Ok(RecordOutcome::Failed {
                    reason: FailureReason::CouldNotDeleteMeta {
                        error: error.to_string(),
                    },
                })
            }
            Err(rollback_error) => {
                error!(
                    record = id,
                    %error,
                    %rollback_error,
                    "record left with terms and meta after failed rollback"
                );
                Ok(RecordOutcome::Failed {
                    reason: FailureReason::RollbackFailed {
                        error: error.to_string(),
                        rollback_error: rollback_error.to_string(),
                    },
                })
            }
        },
    }
}
