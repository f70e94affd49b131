//! Crawl configuration loading for the CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use langgraph_core::config::{validate_config, CrawlConfig};

/// Read `path` (JSON, every field optional) or fall back to defaults, then
/// apply command-line overrides and validate.
pub fn load(path: Option<&Path>, max_retries: Option<u32>) -> Result<CrawlConfig> {
    let mut cfg = match path {
        Some(p) => {
            let raw = fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", p.display()))?
        }
        None => CrawlConfig::default(),
    };
    if max_retries.is_some() {
        cfg.retry.max_retries = max_retries;
    }
    validate_config(&cfg).context("invalid crawl configuration")?;
    Ok(cfg)
}
