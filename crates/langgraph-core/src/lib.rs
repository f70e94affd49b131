//! langgraph-core
//!
//! Concurrent, deduplicating crawl of one Wikipedia article across its
//! language editions:
//! - identity types and collections (page keys, revision timelines)
//! - the `Page` fetch unit with at-most-once fetch per identity
//! - graph assembly (current and point-in-time)
//! - pairwise language dissimilarity
//! - the `Model` coordinating all of the above
//!
//! The crate logs through `tracing` and never installs a subscriber.

pub mod api;
pub mod collections;
pub mod config;
pub mod errors;
pub mod graph;
pub mod keys;
pub mod metrics;
pub mod model;
pub mod page;

pub use crate::errors::{LangGraphError, LangGraphResult};

/// Marks a language-root node key: `<wikibase item>__<language>`.
/// Ordinary wikibase items never contain it.
pub const LANGUAGE_SEPARATOR: &str = "__";

/// Separates a point-in-time snapshot's RFC 3339 timestamp from the rest of a node key.
pub const TIMESTAMP_SEPARATOR: &str = "~~";

/// Convenience re-exports.
pub mod prelude {
    pub use crate::api::{FixtureApi, FixturePage, HttpWikiApi, WikiApi};
    pub use crate::collections::{PageKeySet, RevisionKeys};
    pub use crate::config::{validate_config, CrawlConfig};
    pub use crate::graph::{generate_lang_graph, generate_lang_graph_at, LangGraph, Side};
    pub use crate::keys::{PageKey, RevisionKey};
    pub use crate::metrics::{calculate_dissimilarity_metrics, ScoreEntry, ScoreTable};
    pub use crate::model::{ArticleData, Model};
    pub use crate::page::{FetchContext, Page, PageRegistry, PageSummary};
    pub use crate::{LangGraphError, LangGraphResult};
}
