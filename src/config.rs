//! Engine configuration.
//!
//! All settings can be supplied through a YAML file; every field falls back
//! to a default tuned for the target site, so an empty file (or no file at
//! all) yields a working engine.
//!
//! ```yaml
//! mirrors:
//!   - https://gooool365.org
//!   - https://gooool365.com
//! probe_timeout_ms: 5000
//! workers: 3
//! verify_links: true
//! ```

use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Retry policy applied to idempotent requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added to each delay.
    pub jitter_ms: u64,
    /// Statuses that trigger a retry.
    pub statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            jitter_ms: 100,
            statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Candidate mirrors of the site, in preference order.
    pub mirrors: Vec<String>,
    /// Default headers sent with every request.
    pub headers: Vec<(String, String)>,
    pub probe_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    /// Pause between two mirror probes.
    pub mirror_probe_delay_ms: u64,
    /// Size of the worker pool in the async adapter.
    pub workers: usize,
    /// How many reachability probes a single strategy runs at once.
    pub probe_concurrency: usize,
    /// Turn the reachability filter off entirely.
    pub verify_links: bool,
    /// Verify TLS certificates. The mirrors routinely serve broken chains.
    pub verify_tls: bool,
    /// Iframe sources containing any of these tokens are dropped.
    pub iframe_denylist: Vec<String>,
    /// Pattern matches containing any of these tokens are dropped, in
    /// addition to anything on the resolved mirror's host.
    pub pattern_exclusions: Vec<String>,
    pub retry: RetryConfig,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        let headers = [
            (
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            ),
            ("Accept-Language", "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "same-origin"),
            ("Cache-Control", "max-age=0"),
        ];

        Self {
            mirrors: [
                "https://gooool365.org",
                "https://gooool365.com",
                "https://gooool365.net",
                "https://gooool365.tv",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            probe_timeout_ms: 5_000,
            fetch_timeout_ms: 15_000,
            mirror_probe_delay_ms: 500,
            workers: 3,
            probe_concurrency: 4,
            verify_links: true,
            verify_tls: false,
            iframe_denylist: [
                "google", "yandex", "cackle", "vk.com", "facebook", "twitter", "instagram",
                "metrika", "analytics",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pattern_exclusions: ["yandex", "google", "schema.org", "javascript"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            retry: RetryConfig::default(),
        }
    }
}

impl ScoutConfig {
    /// Load and validate a YAML config file.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScoutError::ConfigIo {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(path, mirrors = config.mirrors.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        let config: ScoutConfig = if raw.trim().is_empty() {
            ScoutConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.mirror_urls()?;
        if self.workers == 0 {
            return Err(ScoutError::ConfigInvalid("workers must be at least 1".into()));
        }
        if self.probe_concurrency == 0 {
            return Err(ScoutError::ConfigInvalid(
                "probe_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parsed mirror list; never empty once validated.
    pub fn mirror_urls(&self) -> Result<Vec<Url>> {
        if self.mirrors.is_empty() {
            return Err(ScoutError::ConfigInvalid("mirror list is empty".into()));
        }
        self.mirrors
            .iter()
            .map(|m| {
                Url::parse(m).map_err(|source| ScoutError::Url {
                    url: m.clone(),
                    source,
                })
            })
            .collect()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn mirror_probe_delay(&self) -> Duration {
        Duration::from_millis(self.mirror_probe_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workers, 3);
        assert_eq!(config.mirror_urls().unwrap()[0].as_str(), "https://gooool365.org/");
        assert!(config.retry.is_retryable(503));
        assert!(!config.retry.is_retryable(404));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = ScoutConfig::from_yaml("").unwrap();
        assert_eq!(config, ScoutConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
mirrors:
  - https://mirror-a.example
  - https://mirror-b.example
workers: 5
verify_links: false
retry:
  max_retries: 1
"#;
        let config = ScoutConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.mirrors.len(), 2);
        assert_eq!(config.workers, 5);
        assert!(!config.verify_links);
        assert_eq!(config.retry.max_retries, 1);
        // Untouched nested fields keep their defaults.
        assert_eq!(config.retry.statuses, vec![429, 500, 502, 503, 504]);
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_empty_mirror_list_rejected() {
        let err = ScoutConfig::from_yaml("mirrors: []").unwrap_err();
        assert!(matches!(err, ScoutError::ConfigInvalid(_)));
    }

    #[test]
    fn test_bad_mirror_rejected() {
        let err = ScoutConfig::from_yaml("mirrors: ['not a url']").unwrap_err();
        assert!(matches!(err, ScoutError::Url { .. }));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = ScoutConfig::from_yaml("workers: 0").unwrap_err();
        assert!(matches!(err, ScoutError::ConfigInvalid(_)));
    }
}
