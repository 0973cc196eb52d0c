use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::CompanyAtsConfig;

pub const GREENHOUSE_API_BASE: &str = "https://boards-api.greenhouse.io";
pub const LEVER_API_BASE: &str = "https://api.lever.co";

/// The static list of companies and the ATS board each one publishes on.
/// Immutable once loaded; tests build one directly with [`Roster::new`].
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<CompanyAtsConfig>,
}

impl Roster {
    pub fn new(entries: Vec<CompanyAtsConfig>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.slug.trim().is_empty() {
                return Err(anyhow!("Roster entry with empty slug"));
            }
            if entry.token.trim().is_empty() {
                return Err(anyhow!("Roster entry '{}' has an empty token", entry.slug));
            }
            if !seen.insert((entry.slug.as_str(), entry.provider)) {
                return Err(anyhow!(
                    "Duplicate roster entry for '{}' on {}",
                    entry.slug,
                    entry.provider
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster file: {}", path.display()))?;
        let entries: Vec<CompanyAtsConfig> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid roster file: {}", path.display()))?;
        Self::new(entries)
    }

    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobsync") {
            proj_dirs.config_dir().join("roster.json")
        } else {
            PathBuf::from("roster.json")
        }
    }

    pub fn entries(&self) -> &[CompanyAtsConfig] {
        &self.entries
    }

    /// Every entry for `slug`, one per provider it is configured on.
    pub fn for_slug<'a>(&'a self, slug: &'a str) -> impl Iterator<Item = &'a CompanyAtsConfig> + 'a {
        self.entries.iter().filter(move |e| e.slug == slug)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Knobs for one outbound ATS call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_attempts: 3,
            base_backoff: Duration::from_millis(400),
            user_agent: format!("jobsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Where each provider's public API lives.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub greenhouse: String,
    pub lever: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            greenhouse: GREENHOUSE_API_BASE.to_string(),
            lever: LEVER_API_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use std::io::Write;

    fn entry(slug: &str, provider: Provider) -> CompanyAtsConfig {
        CompanyAtsConfig {
            slug: slug.to_string(),
            provider,
            token: slug.to_string(),
        }
    }

    #[test]
    fn loads_roster_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"slug": "acme", "provider": "greenhouse", "token": "acmeco"}},
                {{"slug": "acme", "provider": "lever", "token": "acme"}},
                {{"slug": "globex", "provider": "lever", "token": "globex"}}
            ]"#
        )
        .unwrap();

        let roster = Roster::load(file.path()).unwrap();
        assert_eq!(roster.entries().len(), 3);
        assert_eq!(roster.for_slug("acme").count(), 2);
        assert_eq!(roster.for_slug("initech").count(), 0);
    }

    #[test]
    fn rejects_duplicate_slug_provider_pairs() {
        let err = Roster::new(vec![
            entry("acme", Provider::Lever),
            entry("acme", Provider::Lever),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Roster::load(Path::new("/nonexistent/roster.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roster.json"));
    }

    #[test]
    fn fetch_defaults() {
        let opts = FetchOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(15));
        assert_eq!(opts.max_attempts, 3);
        assert_eq!(opts.base_backoff, Duration::from_millis(400));
    }
}
