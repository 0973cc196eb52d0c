//! Provider adapters: each one turns a provider's public job board into
//! [`NormalizedJob`]s.

pub mod greenhouse;
pub mod lever;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::{FetchOptions, ProviderEndpoints};
use crate::fetch::fetch_with_retry;
use crate::models::{NormalizedJob, Provider};

pub use greenhouse::GreenhouseSource;
pub use lever::LeverSource;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {source}")]
    Shape {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// "Fetch the current open postings for token T." An empty list means the
/// board has no open roles; any failure is a [`FetchError`].
pub trait JobSource {
    fn provider(&self) -> Provider;

    fn fetch_postings(&self, token: &str) -> Result<Vec<NormalizedJob>, FetchError>;
}

/// The adapters available to a sync run, looked up by provider.
#[derive(Default)]
pub struct Sources {
    sources: Vec<Box<dyn JobSource>>,
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Greenhouse and Lever sharing one HTTP client.
    pub fn standard(client: Client, endpoints: &ProviderEndpoints, options: &FetchOptions) -> Self {
        Self::new()
            .with(GreenhouseSource::new(client.clone(), &endpoints.greenhouse, options.clone()))
            .with(LeverSource::new(client, &endpoints.lever, options.clone()))
    }

    /// Register an adapter, replacing any earlier one for the same provider.
    pub fn with(mut self, source: impl JobSource + 'static) -> Self {
        self.sources.retain(|s| s.provider() != source.provider());
        self.sources.push(Box::new(source));
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&dyn JobSource> {
        self.sources
            .iter()
            .find(|s| s.provider() == provider)
            .map(|s| s.as_ref())
    }
}

/// GET a board URL and decode its JSON body, mapping each failure mode onto
/// [`FetchError`].
pub(crate) fn get_json<T>(client: &Client, url: &str, options: &FetchOptions) -> Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    let response = fetch_with_retry(client, url, options).map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    serde_json::from_str(&body).map_err(|source| FetchError::Shape {
        url: url.to_string(),
        source,
    })
}

/// Decode each posting on its own so one malformed entry does not cost the
/// whole board. Entries that fail are dropped with a debug log.
pub(crate) fn decode_postings<T>(provider: Provider, postings: Vec<serde_json::Value>) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    postings
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(posting) => Some(posting),
            Err(e) => {
                tracing::debug!(%provider, error = %e, "Dropping malformed posting");
                None
            }
        })
        .collect()
}

/// Trim a provider string, treating blanks as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_rfc3339(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
