use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{decode_postings, get_json, non_blank, FetchError, JobSource};
use crate::config::FetchOptions;
use crate::models::{NormalizedJob, Provider};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverPosting {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    hosted_url: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    categories: Option<LeverCategories>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    team: Option<String>,
}

pub struct LeverSource {
    client: Client,
    base_url: String,
    options: FetchOptions,
}

impl LeverSource {
    pub fn new(client: Client, base_url: &str, options: FetchOptions) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
        }
    }

    fn postings_url(&self, handle: &str) -> String {
        format!("{}/v0/postings/{}?mode=json", self.base_url, handle)
    }
}

impl JobSource for LeverSource {
    fn provider(&self) -> Provider {
        Provider::Lever
    }

    fn fetch_postings(&self, token: &str) -> Result<Vec<NormalizedJob>, FetchError> {
        let postings: Vec<serde_json::Value> =
            get_json(&self.client, &self.postings_url(token), &self.options)?;
        Ok(normalize_postings(postings))
    }
}

fn normalize_postings(postings: Vec<serde_json::Value>) -> Vec<NormalizedJob> {
    decode_postings::<LeverPosting>(Provider::Lever, postings)
        .into_iter()
        .map(normalize)
        .collect()
}

fn normalize(posting: LeverPosting) -> NormalizedJob {
    let categories = posting.categories.unwrap_or_default();
    NormalizedJob {
        external_id: non_blank(posting.id).unwrap_or_default(),
        title: non_blank(posting.text).unwrap_or_default(),
        location: non_blank(categories.location),
        url: non_blank(posting.hosted_url),
        posted_at: posting
            .created_at
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        business_unit_name: non_blank(categories.team),
        category: None,
    }
}
