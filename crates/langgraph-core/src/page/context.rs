//! Fetch context and the joined fan-out primitive.
//!
//! A `FetchContext` bundles what every fetch needs:
//! - the HTTP capability (`Arc<dyn WikiApi>`)
//! - the page registry (identity cache, shared across the whole build)
//! - the crawl configuration
//!
//! Cloning is cheap; each spawned fetch task owns a clone.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;

use super::{Page, PageRegistry};
use crate::api::{ApiError, QueryParams, WikiApi};
use crate::config::CrawlConfig;
use crate::errors::{LangGraphError, LangGraphResult};

#[derive(Clone)]
pub struct FetchContext {
    api: Arc<dyn WikiApi>,
    registry: Arc<PageRegistry>,
    config: Arc<CrawlConfig>,
}

impl FetchContext {
    /// New context with a fresh registry.
    pub fn new(api: Arc<dyn WikiApi>, config: CrawlConfig) -> Self {
        Self::with_registry(api, config, Arc::new(PageRegistry::new()))
    }

    /// New context sharing an existing registry.
    pub fn with_registry(
        api: Arc<dyn WikiApi>,
        config: CrawlConfig,
        registry: Arc<PageRegistry>,
    ) -> Self {
        Self {
            api,
            registry,
            config: Arc::new(config),
        }
    }

    pub fn api(&self) -> &Arc<dyn WikiApi> {
        &self.api
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<PageRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Canonical current-version page for (title, language).
    pub fn page(&self, title: &str, language: &str) -> Arc<Page> {
        self.registry.current(title, language)
    }

    /// GET with retry on transient faults.
    ///
    /// Backoff starts at `retry.initial_delay_ms` and is multiplied by
    /// `retry.multiplier` after every failure, until `retry.max_retries`
    /// (if any) is reached.
    pub(crate) async fn get_with_retry(
        &self,
        language: &str,
        target: &str,
        params: &QueryParams,
    ) -> LangGraphResult<Value> {
        let retry = &self.config.retry;
        let mut attempt: u32 = 0;
        loop {
            match self.api.get(language, params).await {
                Ok(body) => return Ok(body),
                Err(ApiError::Transient(msg)) => {
                    if !retry.allows_retry(attempt) {
                        return Err(LangGraphError::RetriesExhausted {
                            target: format!("{language}:{target}"),
                            attempts: attempt + 1,
                            last: msg,
                        });
                    }
                    let delay = retry.delay_for(attempt);
                    tracing::error!(
                        %language,
                        %target,
                        error = %msg,
                        delay_secs = delay.as_secs_f64(),
                        "transient fault, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(ApiError::Fatal(msg)) => {
                    return Err(LangGraphError::transport(format!("{language}:{target}: {msg}")))
                }
            }
        }
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("pages", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Run every task concurrently and wait for all of them.
///
/// Failures do not cancel siblings. After the whole batch has finished, the
/// first error observed (a task error or a panicked task) is returned.
pub(crate) async fn join_batch<I, F>(tasks: I) -> LangGraphResult<()>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = LangGraphResult<()>> + Send + 'static,
{
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task);
    }

    let mut first_error: Option<LangGraphError> = None;
    while let Some(joined) = set.join_next().await {
        let outcome = joined.map_err(LangGraphError::from).and_then(|r| r);
        if let Err(err) = outcome {
            tracing::error!(%err, "fetch task failed");
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
