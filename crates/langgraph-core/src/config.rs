//! Configuration structures for langgraph-core.
//!
//! The core crate itself does not read environment variables or files. Hosts
//! build a `CrawlConfig` (or deserialize one from JSON) and hand it to the
//! `FetchContext`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{LangGraphError, LangGraphResult};

/// Placeholder substituted with the language code in `ApiConfig::endpoint_template`.
pub const LANGUAGE_PLACEHOLDER: &str = "{lang}";

/// Global configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub links: LinkConfig,
    /// Language allow-list used by the Model when the caller does not pass one.
    pub languages: Option<Vec<String>>,
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint_template: String,
    pub user_agent: String,
    /// Per-request timeout. Expiry counts as a transient fault.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint_template: "https://{lang}.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!("wikilanggraph/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    /// Resolve the API endpoint for one language edition.
    pub fn endpoint_for(&self, language: &str) -> String {
        self.endpoint_template.replace(LANGUAGE_PLACEHOLDER, language)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Backoff policy for transient network faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub multiplier: u32,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2_000,
            multiplier: 4,
            max_retries: None,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = (self.multiplier as u64).saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }

    /// Whether another retry is allowed after `attempt` retries already happened.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        self.max_retries.map_or(true, |max| attempt < max)
    }
}

/// Link filtering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Titles containing this substring are dropped before fetching links.
    pub avoid_substring: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            avoid_substring: ":".to_string(),
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &CrawlConfig) -> LangGraphResult<()> {
    if !cfg.api.endpoint_template.contains(LANGUAGE_PLACEHOLDER) {
        return Err(LangGraphError::invalid_argument(format!(
            "endpoint_template must contain {LANGUAGE_PLACEHOLDER}"
        )));
    }

    if cfg.api.user_agent.trim().is_empty() {
        return Err(LangGraphError::invalid_argument(
            "user_agent must not be empty",
        ));
    }

    if cfg.retry.multiplier == 0 {
        return Err(LangGraphError::invalid_argument(
            "retry multiplier must be greater than zero",
        ));
    }

    if cfg.retry.initial_delay_ms == 0 {
        return Err(LangGraphError::invalid_argument(
            "retry initial_delay_ms must be greater than zero",
        ));
    }

    if let Some(langs) = &cfg.languages {
        if langs.iter().any(|l| l.trim().is_empty()) {
            return Err(LangGraphError::invalid_argument(
                "language codes must not be empty",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CrawlConfig::default();
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn endpoint_substitutes_language() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.endpoint_for("pl"), "https://pl.wikipedia.org/w/api.php");
    }

    #[test]
    fn missing_placeholder_detected() {
        let mut cfg = CrawlConfig::default();
        cfg.api.endpoint_template = "https://example.org/api.php".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn zero_multiplier_detected() {
        let mut cfg = CrawlConfig::default();
        cfg.retry.multiplier = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn backoff_starts_at_two_seconds_and_quadruples() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(0), Duration::from_secs(2));
        assert_eq!(retry.delay_for(1), Duration::from_secs(8));
        assert_eq!(retry.delay_for(2), Duration::from_secs(32));
    }

    #[test]
    fn retry_ceiling_is_optional() {
        let unbounded = RetryConfig::default();
        assert!(unbounded.allows_retry(10_000));

        let bounded = RetryConfig {
            max_retries: Some(2),
            ..RetryConfig::default()
        };
        assert!(bounded.allows_retry(1));
        assert!(!bounded.allows_retry(2));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: CrawlConfig =
            serde_json::from_str(r#"{"retry": {"max_retries": 3}}"#).unwrap();
        assert_eq!(cfg.retry.max_retries, Some(3));
        assert_eq!(cfg.retry.initial_delay_ms, 2_000);
        assert_eq!(cfg.links.avoid_substring, ":");
    }
}
