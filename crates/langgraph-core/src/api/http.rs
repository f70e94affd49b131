//! reqwest-backed `WikiApi`.
//!
//! One `HttpWikiApi` wraps one connection pool. Hosts typically build one per
//! top-level graph build and share it through an `Arc`.

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiError, QueryParams, WikiApi};
use crate::config::ApiConfig;
use crate::errors::{LangGraphError, LangGraphResult};

#[derive(Debug, Clone)]
pub struct HttpWikiApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpWikiApi {
    pub fn new(config: &ApiConfig) -> LangGraphResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| LangGraphError::transport(format!("building http client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing client (and its pool).
    pub fn with_client(client: reqwest::Client, config: &ApiConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl WikiApi for HttpWikiApi {
    async fn get(&self, language: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let url = self.config.endpoint_for(language);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Fatal(format!("http error {status} from {url}")));
        }

        resp.json::<Value>().await.map_err(classify)
    }
}

fn classify(err: reqwest::Error) -> ApiError {
    if err.is_connect() || err.is_timeout() {
        ApiError::Transient(err.to_string())
    } else {
        ApiError::Fatal(err.to_string())
    }
}
