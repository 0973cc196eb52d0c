use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::models::{BusinessUnit, Category, Company, Job, JobUpsert, Provider, Region};

/// Name of the catch-all unit every company gets on first sync.
pub const GENERAL_UNIT: &str = "General";

/// The store operations the sync pipeline needs. Uniqueness of company slug,
/// (company, unit name) and (ats, external id) is enforced by the store
/// itself, so callers never lock.
pub trait JobStore {
    fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>>;

    fn find_business_unit(&self, company_id: i64, name: &str) -> Result<Option<i64>>;

    fn find_or_create_business_unit(&self, company_id: i64, name: &str) -> Result<i64>;

    /// Create or refresh a job keyed by (ats, external id). A refreshed job is
    /// always reopened.
    fn upsert_job(&self, job: &JobUpsert<'_>) -> Result<i64>;

    /// Open jobs for one company and one provider, as (id, external id).
    fn list_open_jobs(&self, company_id: i64, provider: Provider) -> Result<Vec<(i64, String)>>;

    fn bulk_mark_closed(&self, job_ids: &[i64], at: DateTime<Utc>) -> Result<usize>;

    /// Run `f` atomically: either everything it wrote is kept or nothing is.
    fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T>
    where
        Self: Sized;
}

/// Filters for listing stored jobs.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub company: Option<String>,
    pub provider: Option<Provider>,
    pub region: Option<Region>,
    pub category: Option<Category>,
    pub include_closed: bool,
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // Other processes may be syncing into the same file.
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn, path })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobsync") {
            Ok(proj_dirs.data_dir().join("jobsync.db"))
        } else {
            Ok(PathBuf::from("jobsync.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS business_units (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL REFERENCES companies(id),
                name TEXT NOT NULL,
                applications INTEGER NOT NULL DEFAULT 0,
                responses INTEGER NOT NULL DEFAULT 0,
                interviews INTEGER NOT NULL DEFAULT 0,
                offers INTEGER NOT NULL DEFAULT 0,
                median_response_days REAL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (company_id, name)
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ats TEXT NOT NULL CHECK (ats IN ('greenhouse', 'lever')),
                external_id TEXT NOT NULL,
                title TEXT NOT NULL,
                company_id INTEGER NOT NULL REFERENCES companies(id),
                business_unit_id INTEGER NOT NULL REFERENCES business_units(id),
                location TEXT,
                region TEXT,
                category TEXT,
                url TEXT,
                posted_at TEXT NOT NULL,
                closed INTEGER NOT NULL DEFAULT 0,
                closed_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (ats, external_id)
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_company_ats_open ON jobs(company_id, ats, closed);
            CREATE INDEX IF NOT EXISTS idx_jobs_region ON jobs(region);
            CREATE INDEX IF NOT EXISTS idx_jobs_category ON jobs(category);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'jobsync init' first."
            ));
        }
        Ok(())
    }

    // --- Company operations ---

    pub fn create_company(&self, slug: &str, name: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO companies (slug, name) VALUES (?1, ?2)",
                params![slug, name],
            )
            .with_context(|| format!("Failed to create company '{}'", slug))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_companies(&self) -> Result<Vec<Company>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, slug, name, created_at FROM companies ORDER BY slug")?;
        let rows = stmt.query_map([], Self::row_to_company)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list companies")
    }

    fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
        Ok(Company {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    // --- Business unit operations ---

    pub fn list_business_units(&self, company_id: i64) -> Result<Vec<BusinessUnit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, name, applications, responses, interviews, offers,
                    median_response_days
             FROM business_units WHERE company_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map([company_id], |row| {
            Ok(BusinessUnit {
                id: row.get(0)?,
                company_id: row.get(1)?,
                name: row.get(2)?,
                applications: row.get(3)?,
                responses: row.get(4)?,
                interviews: row.get(5)?,
                offers: row.get(6)?,
                median_response_days: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list business units")
    }

    // --- Job operations ---

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut sql = String::from(
            "SELECT j.id, j.ats, j.external_id, j.title, j.company_id, c.slug, j.business_unit_id,
                    j.location, j.region, j.category, j.url, j.posted_at, j.closed, j.closed_at,
                    j.created_at, j.updated_at
             FROM jobs j
             JOIN companies c ON j.company_id = c.id
             WHERE 1=1",
        );

        let mut params: Vec<String> = vec![];

        if let Some(slug) = &filter.company {
            params.push(slug.clone());
            sql.push_str(&format!(" AND c.slug = ?{}", params.len()));
        }
        if let Some(provider) = filter.provider {
            params.push(provider.as_str().to_string());
            sql.push_str(&format!(" AND j.ats = ?{}", params.len()));
        }
        if let Some(region) = filter.region {
            params.push(region.as_str().to_string());
            sql.push_str(&format!(" AND j.region = ?{}", params.len()));
        }
        if let Some(category) = filter.category {
            params.push(category.as_str().to_string());
            sql.push_str(&format!(" AND j.category = ?{}", params.len()));
        }
        if !filter.include_closed {
            sql.push_str(" AND j.closed = 0");
        }

        sql.push_str(" ORDER BY j.posted_at DESC, j.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), Self::row_to_job)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list jobs")
    }

    pub fn get_job(&self, ats: Provider, external_id: &str) -> Result<Option<Job>> {
        self.conn
            .query_row(
                "SELECT j.id, j.ats, j.external_id, j.title, j.company_id, c.slug, j.business_unit_id,
                        j.location, j.region, j.category, j.url, j.posted_at, j.closed, j.closed_at,
                        j.created_at, j.updated_at
                 FROM jobs j
                 JOIN companies c ON j.company_id = c.id
                 WHERE j.ats = ?1 AND j.external_id = ?2",
                params![ats.as_str(), external_id],
                Self::row_to_job,
            )
            .optional()
            .context("Failed to load job")
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let region: Option<String> = row.get(8)?;
        let category: Option<String> = row.get(9)?;
        Ok(Job {
            id: row.get(0)?,
            ats: parse_text(1, row.get(1)?)?,
            external_id: row.get(2)?,
            title: row.get(3)?,
            company_id: row.get(4)?,
            company_slug: row.get(5)?,
            business_unit_id: row.get(6)?,
            location: row.get(7)?,
            region: region.map(|r| parse_text(8, r)).transpose()?,
            category: category.map(|c| parse_text(9, c)).transpose()?,
            url: row.get(10)?,
            posted_at: row.get(11)?,
            closed: row.get(12)?,
            closed_at: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl JobStore for Database {
    fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>> {
        self.conn
            .query_row(
                "SELECT id, slug, name, created_at FROM companies WHERE slug = ?1",
                [slug],
                Self::row_to_company,
            )
            .optional()
            .with_context(|| format!("Failed to look up company '{}'", slug))
    }

    fn find_business_unit(&self, company_id: i64, name: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM business_units WHERE company_id = ?1 AND name = ?2",
                params![company_id, name],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up business unit")
    }

    fn find_or_create_business_unit(&self, company_id: i64, name: &str) -> Result<i64> {
        // A concurrent creator loses the insert but still finds the row.
        self.conn.execute(
            "INSERT INTO business_units (company_id, name) VALUES (?1, ?2)
             ON CONFLICT (company_id, name) DO NOTHING",
            params![company_id, name],
        )?;
        self.find_business_unit(company_id, name)?
            .ok_or_else(|| anyhow!("Business unit '{}' vanished after insert", name))
    }

    fn upsert_job(&self, job: &JobUpsert<'_>) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                "INSERT INTO jobs (ats, external_id, title, company_id, business_unit_id,
                                   location, region, category, url, posted_at, closed, closed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, COALESCE(?10, ?11), 0, NULL)
                 ON CONFLICT (ats, external_id) DO UPDATE SET
                    title = excluded.title,
                    company_id = excluded.company_id,
                    business_unit_id = excluded.business_unit_id,
                    location = excluded.location,
                    region = excluded.region,
                    category = excluded.category,
                    url = excluded.url,
                    posted_at = COALESCE(?10, jobs.posted_at),
                    closed = 0,
                    closed_at = NULL,
                    updated_at = datetime('now')
                 RETURNING id",
                params![
                    job.ats.as_str(),
                    job.external_id,
                    job.title,
                    job.company_id,
                    job.business_unit_id,
                    job.location,
                    job.region.map(|r| r.as_str()),
                    job.category.as_str(),
                    job.url,
                    job.posted_at.map(format_timestamp),
                    format_timestamp(Utc::now()),
                ],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to upsert {} job {}", job.ats, job.external_id))?;
        Ok(id)
    }

    fn list_open_jobs(&self, company_id: i64, provider: Provider) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, external_id FROM jobs
             WHERE company_id = ?1 AND ats = ?2 AND closed = 0",
        )?;
        let rows = stmt.query_map(params![company_id, provider.as_str()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list open jobs")
    }

    fn bulk_mark_closed(&self, job_ids: &[i64], at: DateTime<Utc>) -> Result<usize> {
        if job_ids.is_empty() {
            return Ok(0);
        }
        let closed_at = format_timestamp(at);
        let mut stmt = self.conn.prepare(
            "UPDATE jobs SET closed = 1, closed_at = ?1, updated_at = datetime('now')
             WHERE id = ?2 AND closed = 0",
        )?;
        let mut closed = 0;
        for id in job_ids {
            closed += stmt.execute(params![closed_at, id])?;
        }
        Ok(closed)
    }

    fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        // Dropping `tx` on the error path rolls back.
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_text<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    value.parse().map_err(|e: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}
