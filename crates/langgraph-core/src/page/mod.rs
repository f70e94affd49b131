//! The page fetch unit.
//!
//! A `Page` is one Wikipedia article, current or historical. It is created
//! unfetched by the `PageRegistry` and moves through:
//!
//! `Unfetched -> Fetching -> Fetched (valid | invalid)`
//!
//! `fetch_page` performs that transition at most once per instance. A second
//! caller arriving while the fetch is in flight waits for it; a caller arriving
//! afterwards returns immediately. A structural error (merge conflict, fatal
//! transport error) puts the page back to `Unfetched`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::OnceCell;

use crate::api::{page_params, Action, PageRequest};
use crate::collections::{PageKeySet, RevisionKeys};
use crate::errors::LangGraphResult;
use crate::graph::is_language_root;
use crate::keys::PageKey;

pub mod context;
pub mod merge;
pub(crate) mod parse;
pub mod registry;

pub use context::FetchContext;
pub use merge::merge_json;
pub use parse::decorate_wikibase_item;
pub use registry::{PageIdentity, PageRegistry};

use context::join_batch;
use parse::{locate_payload, parse_page, PagePayload};

/// Observable fetch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Unfetched,
    Fetching,
    Valid,
    Invalid,
}

/// Serializable node annotation: what the graph knows about a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub language: String,
    pub title: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub timestamp: Option<OffsetDateTime>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
struct PageState {
    status: FetchStatus,
    display_title: Option<String>,
    description: Option<String>,
    wikibase_item: Option<String>,
    links: PageKeySet,
    langlinks: PageKeySet,
    backlinks: PageKeySet,
    revisions: RevisionKeys,
    aliases: BTreeSet<String>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            status: FetchStatus::Unfetched,
            display_title: None,
            description: None,
            wikibase_item: None,
            links: PageKeySet::new(),
            langlinks: PageKeySet::new(),
            backlinks: PageKeySet::new(),
            revisions: RevisionKeys::new(),
            aliases: BTreeSet::new(),
        }
    }
}

pub struct Page {
    identity: PageIdentity,
    fetched: OnceCell<()>,
    state: RwLock<PageState>,
}

impl Page {
    pub(crate) fn new(identity: PageIdentity) -> Self {
        Self {
            identity,
            fetched: OnceCell::new(),
            state: RwLock::new(PageState::default()),
        }
    }

    pub fn identity(&self) -> &PageIdentity {
        &self.identity
    }

    pub fn title(&self) -> &str {
        &self.identity.title
    }

    pub fn language(&self) -> &str {
        &self.identity.language
    }

    pub fn revision(&self) -> Option<&str> {
        self.identity.revision.as_deref()
    }

    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        self.identity.timestamp
    }

    pub fn page_key(&self) -> PageKey {
        self.identity.page_key()
    }

    pub fn status(&self) -> FetchStatus {
        self.state.read().status
    }

    pub fn is_fetched(&self) -> bool {
        self.fetched.initialized()
    }

    /// False once the API reported the article as nonexistent.
    pub fn is_valid(&self) -> bool {
        self.state.read().status != FetchStatus::Invalid
    }

    /// Graph node key (with language-root / timestamp markers when applicable).
    pub fn wikibase_item(&self) -> Option<String> {
        self.state.read().wikibase_item.clone()
    }

    pub fn display_title(&self) -> Option<String> {
        self.state.read().display_title.clone()
    }

    pub fn description(&self) -> Option<String> {
        self.state.read().description.clone()
    }

    pub fn links(&self) -> PageKeySet {
        self.state.read().links.clone()
    }

    pub fn langlinks(&self) -> PageKeySet {
        self.state.read().langlinks.clone()
    }

    pub fn backlinks(&self) -> PageKeySet {
        self.state.read().backlinks.clone()
    }

    pub fn revisions(&self) -> RevisionKeys {
        self.state.read().revisions.clone()
    }

    pub fn aliases(&self) -> BTreeSet<String> {
        self.state.read().aliases.clone()
    }

    pub fn summary(&self) -> PageSummary {
        let st = self.state.read();
        PageSummary {
            language: self.identity.language.clone(),
            title: st.display_title.clone(),
            timestamp: self.identity.timestamp,
            description: st.description.clone(),
        }
    }

    /// Fetch this page's metadata once.
    ///
    /// `make_unique` requests outbound links (and, for current pages, the
    /// revision history, description and backlinks) and marks the wikibase
    /// item as a language root.
    #[tracing::instrument(level = "debug", skip_all, fields(page = %self.identity, make_unique = make_unique))]
    pub async fn fetch_page(self: &Arc<Self>, ctx: &FetchContext, make_unique: bool) -> LangGraphResult<()> {
        if self.is_fetched() {
            tracing::debug!("already fetched, skipping");
            return Ok(());
        }
        self.fetched
            .get_or_try_init(|| self.fetch_once(ctx, make_unique))
            .await?;
        Ok(())
    }

    async fn fetch_once(self: &Arc<Self>, ctx: &FetchContext, make_unique: bool) -> LangGraphResult<()> {
        self.state.write().status = FetchStatus::Fetching;
        match self.request_and_apply(ctx, make_unique).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state.write().status = FetchStatus::Unfetched;
                Err(err)
            }
        }
    }

    async fn request_and_apply(self: &Arc<Self>, ctx: &FetchContext, make_unique: bool) -> LangGraphResult<()> {
        let action = if self.identity.is_historical() {
            Action::Parse
        } else {
            Action::Query
        };
        let request = PageRequest {
            action,
            title: &self.identity.title,
            oldid: self.identity.revision.as_deref(),
            with_links: make_unique,
            with_revisions: make_unique && !self.identity.is_historical(),
        };
        let base = page_params(&request);
        let language = self.identity.language.as_str();

        let mut data = ctx.get_with_retry(language, request.target(), &base).await?;
        while let Some(cont) = take_continuation(&mut data) {
            tracing::debug!(?cont, "continuing fetch");
            let mut params = base.clone();
            params.extend(cont);
            let next = ctx.get_with_retry(language, request.target(), &params).await?;
            data = merge_json(data, next)?;
        }

        let parsed = match locate_payload(action, &data) {
            PagePayload::Found(payload) => parse_page(payload, &self.identity, make_unique),
            PagePayload::Missing(reason) => {
                tracing::warn!(%reason, "page does not exist and will be removed");
                self.state.write().status = FetchStatus::Invalid;
                return Ok(());
            }
            PagePayload::Malformed(reason) => {
                tracing::error!(%reason, "unusable page payload, marking invalid");
                self.state.write().status = FetchStatus::Invalid;
                return Ok(());
            }
        };

        let aliases = parsed.aliases.clone();
        {
            let mut st = self.state.write();
            st.display_title = parsed.display_title;
            st.description = parsed.description;
            st.wikibase_item = parsed.wikibase_item;
            st.links = parsed.links;
            st.langlinks = parsed.langlinks;
            st.backlinks = parsed.backlinks;
            st.revisions = parsed.revisions;
            st.aliases = parsed.aliases;
            st.status = FetchStatus::Valid;
        }

        for alias in aliases {
            ctx.registry()
                .register_alias(self.identity.with_title(alias), self);
        }
        Ok(())
    }

    /// Fetch every langlink page, optionally restricted to `languages`, and
    /// drop the ones that do not exist.
    pub async fn fetch_langlinks(
        self: &Arc<Self>,
        ctx: &FetchContext,
        languages: Option<&[String]>,
        make_unique: bool,
    ) -> LangGraphResult<()> {
        self.fetch_page(ctx, false).await?;
        let mut langlinks = self.langlinks();
        if let Some(allowed) = languages {
            langlinks.filter_languages(allowed);
        }
        langlinks.fetch_all(ctx, make_unique).await?;
        // A key may resolve back to this page, so no guard may be held here.
        langlinks.remove_nonexistent(ctx.registry());
        self.state.write().langlinks = langlinks;
        Ok(())
    }

    /// Fetch every outbound link whose title does not contain `avoid`, and
    /// drop the ones that do not exist.
    pub async fn fetch_links(self: &Arc<Self>, ctx: &FetchContext, avoid: &str) -> LangGraphResult<()> {
        self.fetch_page(ctx, false).await?;
        let mut links = self.links();
        links.filter_titles(avoid);
        links.fetch_all(ctx, false).await?;
        // Self-links and links to this page's own redirects resolve to `self`.
        links.remove_nonexistent(ctx.registry());
        self.state.write().links = links;
        Ok(())
    }

    /// This page followed by every resolved langlink page.
    pub fn all_language_versions(self: &Arc<Self>, registry: &PageRegistry) -> Vec<Arc<Page>> {
        let mut out = vec![Arc::clone(self)];
        for page in self.langlinks().resolve_pages(registry) {
            if !out.iter().any(|p| Arc::ptr_eq(p, &page)) {
                out.push(page);
            }
        }
        out
    }

    /// Link targets as right-side nodes. Links resolving to a language root
    /// (this page itself, or a current root seen from a historical page) are
    /// left out.
    pub fn links_as_graph_nodes(&self, registry: &PageRegistry) -> Vec<(String, PageSummary)> {
        self.links()
            .graph_nodes(registry)
            .filter(|(item, _)| !is_language_root(item))
            .collect()
    }

    pub fn langlinks_as_graph_nodes(&self, registry: &PageRegistry) -> Vec<(String, PageSummary)> {
        self.langlinks().graph_nodes(registry).collect()
    }

    /// Edges from this page's node to each of its links. Empty without a wikibase item.
    pub fn links_as_graph_edges(&self, registry: &PageRegistry) -> Vec<(String, String)> {
        match self.wikibase_item() {
            Some(from) => self
                .links()
                .graph_edges(registry, &from)
                .filter(|(_, to)| !is_language_root(to))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Own revisions plus every langlink's revisions, newest first.
    pub fn timepoints_all_languages(&self, registry: &PageRegistry) -> RevisionKeys {
        self.revisions().concat(&self.langlinks().revisions(registry))
    }

    /// `timepoints_all_languages` grouped by language code.
    pub fn timepoints_by_language(&self, registry: &PageRegistry) -> BTreeMap<String, RevisionKeys> {
        let mut grouped = self.timepoints_all_languages(registry).by_language();
        grouped.entry(self.identity.language.clone()).or_default();
        grouped
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state.read();
        f.debug_struct("Page")
            .field("identity", &self.identity)
            .field("status", &st.status)
            .field("wikibase_item", &st.wikibase_item)
            .field("links", &st.links.len())
            .field("langlinks", &st.langlinks.len())
            .finish()
    }
}

/// Pop the `continue` object and flatten it into request params.
fn take_continuation(data: &mut serde_json::Value) -> Option<BTreeMap<String, String>> {
    let cont = data.as_object_mut()?.remove("continue")?;
    let obj = cont.as_object()?;
    Some(
        obj.iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect(),
    )
}
