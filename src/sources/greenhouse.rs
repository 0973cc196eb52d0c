use reqwest::blocking::Client;
use serde::Deserialize;

use super::{decode_postings, get_json, non_blank, parse_rfc3339, FetchError, JobSource};
use crate::config::FetchOptions;
use crate::models::{NormalizedJob, Provider};

#[derive(Debug, Deserialize)]
struct GreenhouseBoard {
    jobs: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    absolute_url: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    location: Option<GreenhouseLocation>,
    #[serde(default)]
    departments: Option<Vec<GreenhouseDepartment>>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseDepartment {
    #[serde(default)]
    name: Option<String>,
}

pub struct GreenhouseSource {
    client: Client,
    base_url: String,
    options: FetchOptions,
}

impl GreenhouseSource {
    pub fn new(client: Client, base_url: &str, options: FetchOptions) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
        }
    }

    fn board_url(&self, token: &str) -> String {
        format!("{}/v1/boards/{}/jobs?content=true", self.base_url, token)
    }
}

impl JobSource for GreenhouseSource {
    fn provider(&self) -> Provider {
        Provider::Greenhouse
    }

    fn fetch_postings(&self, token: &str) -> Result<Vec<NormalizedJob>, FetchError> {
        let board: GreenhouseBoard = get_json(&self.client, &self.board_url(token), &self.options)?;
        Ok(normalize_board(board))
    }
}

fn normalize_board(board: GreenhouseBoard) -> Vec<NormalizedJob> {
    decode_postings::<GreenhouseJob>(Provider::Greenhouse, board.jobs)
        .into_iter()
        .map(normalize)
        .collect()
}

fn normalize(job: GreenhouseJob) -> NormalizedJob {
    let posted_at = parse_rfc3339(job.updated_at.as_deref())
        .or_else(|| parse_rfc3339(job.created_at.as_deref()));

    NormalizedJob {
        external_id: job.id.as_ref().map(external_id).unwrap_or_default(),
        title: non_blank(job.title).unwrap_or_default(),
        location: non_blank(job.location.and_then(|l| l.name)),
        url: non_blank(job.absolute_url),
        posted_at,
        business_unit_name: job
            .departments
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|d| non_blank(d.name)),
        category: None,
    }
}

// Greenhouse ids are numbers, but accept strings too.
fn external_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Vec<NormalizedJob> {
        normalize_board(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn maps_greenhouse_fields() {
        let jobs = parse(
            r#"{"jobs": [{
                "id": 4012345,
                "title": "Senior Backend Engineer",
                "absolute_url": "https://boards.greenhouse.io/acme/jobs/4012345",
                "updated_at": "2026-05-04T12:30:00-04:00",
                "created_at": "2026-01-01T00:00:00Z",
                "location": {"name": "Austin, TX"},
                "departments": [{"name": "Platform"}, {"name": "Engineering"}]
            }]}"#,
        );

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.external_id, "4012345");
        assert_eq!(job.title, "Senior Backend Engineer");
        assert_eq!(job.location.as_deref(), Some("Austin, TX"));
        assert_eq!(job.url.as_deref(), Some("https://boards.greenhouse.io/acme/jobs/4012345"));
        assert_eq!(job.posted_at.unwrap().to_rfc3339(), "2026-05-04T16:30:00+00:00");
        assert_eq!(job.business_unit_name.as_deref(), Some("Platform"));
        assert!(job.category.is_none());
    }

    #[test]
    fn falls_back_to_created_at_then_nothing() {
        let jobs = parse(
            r#"{"jobs": [
                {"id": 1, "title": "A", "updated_at": "not a date", "created_at": "2026-02-02T00:00:00Z"},
                {"id": 2, "title": "B"}
            ]}"#,
        );
        assert_eq!(jobs[0].posted_at.unwrap().to_rfc3339(), "2026-02-02T00:00:00+00:00");
        assert!(jobs[1].posted_at.is_none());
        assert!(jobs[1].location.is_none());
        assert!(jobs[1].business_unit_name.is_none());
    }

    #[test]
    fn missing_id_or_title_normalizes_to_empty() {
        let jobs = parse(r#"{"jobs": [{"title": "No id"}, {"id": "77", "title": "  "}]}"#);
        assert_eq!(jobs[0].external_id, "");
        assert_eq!(jobs[1].external_id, "77");
        assert_eq!(jobs[1].title, "");
    }

    #[test]
    fn one_malformed_job_does_not_sink_the_board() {
        let jobs = parse(
            r#"{"jobs": [
                {"id": 1, "title": "Engineer", "departments": null, "location": null},
                {"id": 2, "title": ["Designer"]},
                {"id": 3, "title": "Recruiter", "location": "Remote"}
            ]}"#,
        );
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].external_id, "1");
        assert!(jobs[0].business_unit_name.is_none());
    }

    #[test]
    fn board_without_jobs_key_is_rejected() {
        assert!(serde_json::from_str::<GreenhouseBoard>(r#"{"error": "not found"}"#).is_err());
        assert!(parse(r#"{"jobs": []}"#).is_empty());
    }
}
