//! The sync run: for every roster entry, pull the provider's open postings,
//! upsert them, and close whatever the provider no longer lists.
//!
//! Companies are processed one after another. Each company's outcome becomes
//! one [`SyncResult`]; recoverable problems are reported in its `note` and
//! never stop the rest of the run.

use anyhow::Result;
use chrono::Utc;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashSet;

use crate::classify::{categorize, region_from_location};
use crate::config::Roster;
use crate::db::JobStore;
use crate::models::{Company, CompanyAtsConfig, JobUpsert, NormalizedJob, Provider, SyncResult};
use crate::sources::Sources;
use crate::units::{ensure_general_unit, resolve_business_unit};

pub const COMPANY_NOT_FOUND: &str = "company not found";

/// Outcome of a whole run, as handed back to whoever triggered it.
/// Serializes as `{"ok": true, "results": [..]}` or
/// `{"ok": false, "error": ".."}`.
#[derive(Debug)]
pub enum SyncReport {
    Completed { results: Vec<SyncResult> },
    Failed { error: String },
}

impl SyncReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, SyncReport::Completed { .. })
    }
}

impl Serialize for SyncReport {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut state = serializer.serialize_struct("SyncReport", 2)?;
        state.serialize_field("ok", &self.is_ok())?;
        match self {
            SyncReport::Completed { results } => state.serialize_field("results", results)?,
            SyncReport::Failed { error } => state.serialize_field("error", error)?,
        }
        state.end()
    }
}

/// Store-side readiness check run before any company is touched.
pub trait ReadyCheck {
    fn check_ready(&self) -> Result<()>;
}

impl ReadyCheck for crate::db::Database {
    fn check_ready(&self) -> Result<()> {
        self.ensure_initialized()
    }
}

pub struct Synchronizer<'a, S> {
    store: &'a S,
    sources: &'a Sources,
    roster: &'a Roster,
}

impl<'a, S> Synchronizer<'a, S>
where
    S: JobStore + ReadyCheck,
{
    pub fn new(store: &'a S, sources: &'a Sources, roster: &'a Roster) -> Self {
        Self {
            store,
            sources,
            roster,
        }
    }

    /// Run for every roster entry, or only the entries for `only`.
    pub fn trigger(&self, only: Option<&str>) -> SyncReport {
        match self.run(only) {
            Ok(results) => SyncReport::Completed { results },
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "sync run failed");
                SyncReport::Failed {
                    error: format!("{:#}", e),
                }
            }
        }
    }

    pub fn run(&self, only: Option<&str>) -> Result<Vec<SyncResult>> {
        self.store.check_ready()?;

        let entries: Vec<&CompanyAtsConfig> = match only {
            Some(slug) => self.roster.for_slug(slug).collect(),
            None => self.roster.entries().iter().collect(),
        };

        if let (Some(slug), true) = (only, entries.is_empty()) {
            tracing::info!(slug, "slug is not in the roster");
            return Ok(vec![SyncResult::skipped(slug, None, COMPANY_NOT_FOUND)]);
        }

        tracing::info!(companies = entries.len(), "starting sync run");
        Ok(entries.into_iter().map(|e| self.sync_company(e)).collect())
    }

    /// One company on one provider. Never fails: problems end up in `note`.
    pub fn sync_company(&self, config: &CompanyAtsConfig) -> SyncResult {
        let result = match self.try_sync_company(config) {
            Ok(result) => result,
            Err(e) => {
                // Everything written inside the reconcile transaction was
                // rolled back, so nothing was upserted or closed.
                tracing::warn!(
                    slug = %config.slug,
                    provider = %config.provider,
                    error = %format!("{:#}", e),
                    "store error, company skipped"
                );
                SyncResult::skipped(&config.slug, Some(config.provider), format!("store error: {:#}", e))
            }
        };

        tracing::info!(
            slug = %result.slug,
            provider = %config.provider,
            upserted = result.upserted_count,
            closed = result.closed_count,
            note = result.note.as_deref().unwrap_or(""),
            "company synced"
        );
        result
    }

    fn try_sync_company(&self, config: &CompanyAtsConfig) -> Result<SyncResult> {
        let slug = config.slug.as_str();
        let provider = config.provider;

        let Some(company) = self.store.find_company_by_slug(slug)? else {
            return Ok(SyncResult::skipped(slug, Some(provider), COMPANY_NOT_FOUND));
        };

        ensure_general_unit(self.store, company.id)?;

        let Some(source) = self.sources.get(provider) else {
            return Ok(SyncResult::skipped(
                slug,
                Some(provider),
                format!("no adapter for provider {}", provider),
            ));
        };

        // A failed fetch must never look like an empty board: bail out
        // before anything is closed.
        let postings = match source.fetch_postings(&config.token) {
            Ok(postings) => postings,
            Err(e) => {
                tracing::warn!(slug, %provider, error = %e, "fetch failed");
                return Ok(SyncResult::skipped(slug, Some(provider), format!("fetch failed: {}", e)));
            }
        };

        let (upserted, closed) = self
            .store
            .in_transaction(|store| reconcile(store, &company, provider, &postings))?;

        Ok(SyncResult {
            slug: slug.to_string(),
            provider: Some(provider),
            upserted_count: upserted,
            closed_count: closed,
            note: None,
        })
    }
}

/// Upsert every valid posting, then close this company's open jobs on this
/// provider that were not seen. Returns (upserted, closed).
fn reconcile<S: JobStore>(
    store: &S,
    company: &Company,
    provider: Provider,
    postings: &[NormalizedJob],
) -> Result<(usize, usize)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut upserted = 0;

    for posting in postings {
        let external_id = posting.external_id.trim();
        let title = posting.title.trim();
        if external_id.is_empty() || title.is_empty() {
            tracing::debug!(
                slug = %company.slug,
                %provider,
                external_id,
                "dropping posting without id or title"
            );
            continue;
        }
        seen.insert(external_id);

        let category = posting.category.unwrap_or_else(|| categorize(title));
        let location = posting.location.as_deref();
        let region = location.and_then(region_from_location);
        let business_unit_id =
            resolve_business_unit(store, company.id, posting.business_unit_name.as_deref())?;

        store.upsert_job(&JobUpsert {
            ats: provider,
            external_id,
            title,
            company_id: company.id,
            business_unit_id,
            location,
            region,
            category,
            url: posting.url.as_deref(),
            posted_at: posting.posted_at,
        })?;
        upserted += 1;
    }

    let missing: Vec<i64> = store
        .list_open_jobs(company.id, provider)?
        .into_iter()
        .filter(|(_, external_id)| !seen.contains(external_id.as_str()))
        .map(|(id, _)| id)
        .collect();

    let closed = store.bulk_mark_closed(&missing, Utc::now())?;
    Ok((upserted, closed))
}
