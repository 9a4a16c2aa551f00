//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML file (or none at all) yields a
//! working configuration. The CLI layers its own flags on top.
//!
//! ```yaml
//! base_url: "http://travaux.ovh.net/"
//! user_agent: "ovh-task-broadcast-kikoo-IAAS"
//! request_timeout_secs: 30
//! page_concurrency: 3
//! detail_concurrency: 8
//! max_retries: 2
//! page_error_policy: continue
//! ```

use crate::error::{Result, ScrapeError};
use crate::urls::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// Identity the tracker has always seen from this client.
pub const DEFAULT_USER_AGENT: &str = "ovh-task-broadcast-kikoo-IAAS";

/// What to do when one page of a range fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Fail the whole listing with the first error in page order.
    #[default]
    FailFast,
    /// Log the failure, record it in the listing, keep the other pages.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Listing pages fetched at once.
    pub page_concurrency: usize,
    /// Detail pages fetched at once, for enrichment and the newspaper.
    pub detail_concurrency: usize,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    pub page_error_policy: PageErrorPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            page_concurrency: 3,
            detail_concurrency: 8,
            max_retries: 2,
            retry_base_delay_ms: 500,
            page_error_policy: PageErrorPolicy::FailFast,
        }
    }
}

impl ScraperConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ScrapeError::Config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ScrapeError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(base_url = %config.base_url, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ScrapeError::Config(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::Config(format!(
                "base_url {:?} must be http or https",
                self.base_url
            )));
        }
        if self.page_concurrency == 0 || self.detail_concurrency == 0 {
            return Err(ScrapeError::Config(
                "concurrency values must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScraperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_concurrency, 3);
        assert_eq!(config.page_error_policy, PageErrorPolicy::FailFast);
        assert_eq!(config.user_agent, "ovh-task-broadcast-kikoo-IAAS");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ScraperConfig::from_yaml_str(
            "base_url: \"https://status.example.net/\"\npage_error_policy: continue\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "https://status.example.net/");
        assert_eq!(config.page_error_policy, PageErrorPolicy::Continue);
        assert_eq!(config.detail_concurrency, 8);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            ScraperConfig::from_yaml_str("  \n").unwrap(),
            ScraperConfig::default()
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ScraperConfig::from_yaml_str("base_url: \"ftp://x/\"").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));

        let err = ScraperConfig::from_yaml_str("page_concurrency: 0").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));

        let err = ScraperConfig::from_yaml_str("base_url: [1, 2]").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScraperConfig::load(Path::new("/nonexistent/travaux.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
