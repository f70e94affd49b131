//! Session-level coordinator.
//!
//! A `Model` owns the HTTP capability, the crawl configuration and one page
//! registry per loaded article. It exposes the operations a front end needs:
//! - load an article (graph, metrics, timeline)
//! - re-filter the loaded graph by language without network activity
//! - rebuild the graph as it stood at a past moment
//! - prefetch every known revision

use std::sync::Arc;

use time::OffsetDateTime;

use crate::api::WikiApi;
use crate::collections::RevisionKeys;
use crate::config::{validate_config, CrawlConfig};
use crate::errors::{LangGraphError, LangGraphResult};
use crate::graph::{generate_lang_graph, generate_lang_graph_at, LangGraph};
use crate::metrics::{calculate_dissimilarity_metrics, ScoreTable};
use crate::page::context::join_batch;
use crate::page::{FetchContext, Page, PageRegistry};

/// What a front end renders for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleData {
    pub network: LangGraph,
    pub metrics: ScoreTable,
    pub timestamps: RevisionKeys,
}

pub struct Model {
    api: Arc<dyn WikiApi>,
    config: CrawlConfig,
    registry: Arc<PageRegistry>,
    /// Allow-list the current registry's langlinks were filtered with.
    registry_languages: Option<Vec<String>>,
    starting_page: Option<Arc<Page>>,
    full_network: Option<LangGraph>,
    network: Option<LangGraph>,
    metrics: Option<ScoreTable>,
    timestamps: Option<RevisionKeys>,
}

impl Model {
    pub fn new(api: Arc<dyn WikiApi>, config: CrawlConfig) -> LangGraphResult<Self> {
        validate_config(&config)?;
        Ok(Self {
            api,
            config,
            registry: Arc::new(PageRegistry::new()),
            registry_languages: None,
            starting_page: None,
            full_network: None,
            network: None,
            metrics: None,
            timestamps: None,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn network(&self) -> Option<&LangGraph> {
        self.network.as_ref()
    }

    pub fn metrics(&self) -> Option<&ScoreTable> {
        self.metrics.as_ref()
    }

    pub fn timestamps(&self) -> Option<&RevisionKeys> {
        self.timestamps.as_ref()
    }

    pub fn starting_page(&self) -> Option<&Arc<Page>> {
        self.starting_page.as_ref()
    }

    fn context(&self) -> FetchContext {
        FetchContext::with_registry(
            Arc::clone(&self.api),
            self.config.clone(),
            Arc::clone(&self.registry),
        )
    }

    /// Load an article using the configured language allow-list.
    pub async fn get_article_data(&mut self, title: &str, language: &str) -> LangGraphResult<ArticleData> {
        let languages = self.config.languages.clone();
        self.get_article_data_in(title, language, languages.as_deref())
            .await
    }

    /// Load an article, restricting language roots to `languages`.
    ///
    /// Starts a fresh page registry: langlink filtering is permanent per page.
    #[tracing::instrument(skip(self))]
    pub async fn get_article_data_in(
        &mut self,
        title: &str,
        language: &str,
        languages: Option<&[String]>,
    ) -> LangGraphResult<ArticleData> {
        self.registry = Arc::new(PageRegistry::new());
        self.registry_languages = languages.map(<[String]>::to_vec);
        let ctx = self.context();
        let start = ctx.page(title, language);

        let graph = generate_lang_graph(&ctx, LangGraph::new(), &start, languages).await?;
        let metrics = calculate_dissimilarity_metrics(&graph);
        let timestamps = start.timepoints_all_languages(ctx.registry());
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            pairs = metrics.len(),
            revisions = timestamps.len(),
            "article loaded"
        );

        self.starting_page = Some(start);
        self.full_network = Some(graph.clone());
        self.network = Some(graph.clone());
        self.metrics = Some(metrics.clone());
        self.timestamps = Some(timestamps.clone());
        Ok(ArticleData {
            network: graph,
            metrics,
            timestamps,
        })
    }

    /// Rebuild the network and metrics as they stood at `moment`.
    ///
    /// Reuses the current registry, so pages fetched by a previous
    /// `get_article_data` for the same article are not fetched again. A
    /// registry whose langlinks were narrowed beyond the configured
    /// allow-list is replaced first.
    #[tracing::instrument(skip(self, moment), fields(%moment))]
    pub async fn get_article_timestamp(
        &mut self,
        title: &str,
        moment: OffsetDateTime,
        language: &str,
    ) -> LangGraphResult<ArticleData> {
        if self.langlinks_narrowed() {
            tracing::debug!(
                loaded = ?self.registry_languages,
                "langlinks were narrowed by the last load, starting a fresh registry"
            );
            self.registry = Arc::new(PageRegistry::new());
            self.registry_languages = None;
        }
        let ctx = self.context();
        let start = ctx.page(title, language);
        let languages = self.config.languages.clone();

        let graph =
            generate_lang_graph_at(&ctx, LangGraph::new(), &start, moment, languages.as_deref())
                .await?;
        let metrics = calculate_dissimilarity_metrics(&graph);
        let timestamps = start.timepoints_all_languages(ctx.registry());

        self.network = Some(graph.clone());
        self.metrics = Some(metrics.clone());
        Ok(ArticleData {
            network: graph,
            metrics,
            timestamps,
        })
    }

    fn langlinks_narrowed(&self) -> bool {
        match self.registry_languages.as_deref() {
            None | Some([]) => false,
            Some(loaded) => self.config.languages.as_deref() != Some(loaded),
        }
    }

    /// Restrict the loaded network to `allowed` languages and recompute metrics.
    /// No network activity.
    pub fn select_languages<S: AsRef<str>>(&mut self, allowed: &[S]) -> LangGraphResult<ArticleData> {
        let full = self
            .full_network
            .as_ref()
            .ok_or_else(|| LangGraphError::invariant("no article loaded"))?;
        let network = full.restrict_languages(allowed);
        let metrics = calculate_dissimilarity_metrics(&network);

        self.network = Some(network.clone());
        self.metrics = Some(metrics.clone());
        Ok(ArticleData {
            network,
            metrics,
            timestamps: self.timestamps.clone().unwrap_or_default(),
        })
    }

    /// Fetch a historical page for every known revision in one joined batch.
    /// Returns how many of them resolved.
    pub async fn fetch_revisions(&self) -> LangGraphResult<usize> {
        let timestamps = self
            .timestamps
            .as_ref()
            .ok_or_else(|| LangGraphError::invariant("no article loaded"))?;
        let ctx = self.context();
        let pages: Vec<Arc<Page>> = timestamps
            .iter()
            .map(|rev| ctx.registry().historical(rev))
            .collect();

        join_batch(pages.iter().map(|page| {
            let page = Arc::clone(page);
            let ctx = ctx.clone();
            async move { page.fetch_page(&ctx, true).await }
        }))
        .await?;

        let valid = pages.iter().filter(|p| p.is_valid()).count();
        tracing::info!(requested = pages.len(), valid, "revisions fetched");
        Ok(valid)
    }

    /// Whether (title, language) names an existing article.
    ///
    /// Uses a throwaway registry so the probe never shapes a later graph build.
    pub async fn check_article_exists(&self, title: &str, language: &str) -> LangGraphResult<bool> {
        let ctx = FetchContext::new(Arc::clone(&self.api), self.config.clone());
        let page = ctx.page(title, language);
        page.fetch_page(&ctx, false).await?;
        Ok(page.is_valid())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("config", &self.config)
            .field("pages", &self.registry.len())
            .field("starting_page", &self.starting_page)
            .finish_non_exhaustive()
    }
}
