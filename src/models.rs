use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Greenhouse,
    Lever,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Greenhouse => "greenhouse",
            Provider::Lever => "lever",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "greenhouse" => Ok(Provider::Greenhouse),
            "lever" => Ok(Provider::Lever),
            other => Err(anyhow!("Unknown provider '{}' (expected greenhouse or lever)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Software,
    DataAnalytics,
    ProductManagement,
    Design,
    DevopsSre,
    Security,
    Qa,
    ItSupport,
    Marketing,
    Sales,
    Operations,
    Finance,
    Hr,
    Legal,
    Other,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Software,
        Category::DataAnalytics,
        Category::ProductManagement,
        Category::Design,
        Category::DevopsSre,
        Category::Security,
        Category::Qa,
        Category::ItSupport,
        Category::Marketing,
        Category::Sales,
        Category::Operations,
        Category::Finance,
        Category::Hr,
        Category::Legal,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Software => "software",
            Category::DataAnalytics => "data_analytics",
            Category::ProductManagement => "product_management",
            Category::Design => "design",
            Category::DevopsSre => "devops_sre",
            Category::Security => "security",
            Category::Qa => "qa",
            Category::ItSupport => "it_support",
            Category::Marketing => "marketing",
            Category::Sales => "sales",
            Category::Operations => "operations",
            Category::Finance => "finance",
            Category::Hr => "hr",
            Category::Legal => "legal",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| anyhow!("Unknown category '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    Asia,
    Oceania,
    LatinAmerica,
    MiddleEast,
    Africa,
    Remote,
    Global,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::Asia,
        Region::Oceania,
        Region::LatinAmerica,
        Region::MiddleEast,
        Region::Africa,
        Region::Remote,
        Region::Global,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "north_america",
            Region::Europe => "europe",
            Region::Asia => "asia",
            Region::Oceania => "oceania",
            Region::LatinAmerica => "latin_america",
            Region::MiddleEast => "middle_east",
            Region::Africa => "africa",
            Region::Remote => "remote",
            Region::Global => "global",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Region::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| anyhow!("Unknown region '{}'", s))
    }
}

/// One roster entry: which ATS board to pull for a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAtsConfig {
    pub slug: String,
    pub provider: Provider,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub applications: i64,
    pub responses: i64,
    pub interviews: i64,
    pub offers: i64,
    pub median_response_days: Option<f64>,
}

/// A posting as a provider adapter hands it over, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedJob {
    pub external_id: String,
    pub title: String,
    pub location: Option<String>,
    pub url: Option<String>,
    /// `None` when the provider gave no usable timestamp.
    pub posted_at: Option<DateTime<Utc>>,
    pub business_unit_name: Option<String>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub ats: Provider,
    pub external_id: String,
    pub title: String,
    pub company_id: i64,
    pub company_slug: String, // denormalized for listing
    pub business_unit_id: i64,
    pub location: Option<String>,
    pub region: Option<Region>,
    pub category: Option<Category>,
    pub url: Option<String>,
    pub posted_at: String,
    pub closed: bool,
    pub closed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything the store needs to create or refresh one job row.
#[derive(Debug, Clone)]
pub struct JobUpsert<'a> {
    pub ats: Provider,
    pub external_id: &'a str,
    pub title: &'a str,
    pub company_id: i64,
    pub business_unit_id: i64,
    pub location: Option<&'a str>,
    pub region: Option<Region>,
    pub category: Category,
    pub url: Option<&'a str>,
    /// Without an upstream timestamp, a new row gets "now" and an existing
    /// row keeps what it has.
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub slug: String,
    pub provider: Option<Provider>,
    pub upserted_count: usize,
    pub closed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SyncResult {
    pub fn skipped(slug: &str, provider: Option<Provider>, note: impl Into<String>) -> Self {
        Self {
            slug: slug.to_string(),
            provider,
            upserted_count: 0,
            closed_count: 0,
            note: Some(note.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_their_names() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        for r in Region::ALL {
            assert_eq!(r.as_str().parse::<Region>().unwrap(), r);
        }
        assert_eq!("Lever".parse::<Provider>().unwrap(), Provider::Lever);
        assert!("workday".parse::<Provider>().is_err());
    }

    #[test]
    fn sync_result_serializes_camel_case_and_omits_empty_note() {
        let result = SyncResult {
            slug: "acme".into(),
            provider: Some(Provider::Greenhouse),
            upserted_count: 2,
            closed_count: 1,
            note: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["provider"], "greenhouse");
        assert_eq!(value["upsertedCount"], 2);
        assert_eq!(value["closedCount"], 1);
        assert!(value.get("note").is_none());
    }
}
