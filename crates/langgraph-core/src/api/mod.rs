//! HTTP capability consumed by the crawl engine.
//!
//! The engine only needs "GET the MediaWiki API of language X with these
//! params and hand back JSON". That capability is the `WikiApi` trait:
//! - `HttpWikiApi` implements it with reqwest
//! - `FixtureApi` implements it from in-memory payloads
//!
//! Implementations classify failures: `ApiError::Transient` is retried with
//! backoff by the fetch path, `ApiError::Fatal` is propagated.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

pub mod fixture;
pub mod http;
pub mod params;

pub use fixture::{FixtureApi, FixturePage};
pub use http::HttpWikiApi;
pub use params::{page_params, Action, PageRequest};

/// Query-string parameters, ordered for stable request logging.
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connect failure or timeout.
    #[error("transient network fault: {0}")]
    Transient(String),

    #[error("request failed: {0}")]
    Fatal(String),
}

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// GET a MediaWiki API endpoint and return the decoded JSON body.
#[async_trait]
pub trait WikiApi: Send + Sync {
    async fn get(&self, language: &str, params: &QueryParams) -> Result<Value, ApiError>;
}
