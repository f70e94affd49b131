//! Graph assembly pipelines.
//!
//! Current graph:
//! 1. fetch the starting page as a language root
//! 2. add it as a node
//! 3. fetch its langlinks (optionally restricted) as language roots, add them
//! 4. fetch the outbound links of every language version as one joined batch
//! 5. add each root's links as nodes plus root -> link edges
//!
//! Point-in-time graph: per language, the newest revision at or before the
//! requested moment replaces the current page in steps 4-5.

use std::sync::Arc;

use time::OffsetDateTime;

use super::LangGraph;
use crate::errors::{LangGraphError, LangGraphResult};
use crate::page::context::join_batch;
use crate::page::{FetchContext, Page};

/// Build the current language graph around `starting_page`.
#[tracing::instrument(skip_all, fields(start = %starting_page.identity()))]
pub async fn generate_lang_graph(
    ctx: &FetchContext,
    mut graph: LangGraph,
    starting_page: &Arc<Page>,
    languages: Option<&[String]>,
) -> LangGraphResult<LangGraph> {
    fetch_starting_page(ctx, starting_page).await?;
    add_page_to_graph(&mut graph, starting_page);

    starting_page.fetch_langlinks(ctx, languages, true).await?;
    graph.add_nodes_from(starting_page.langlinks_as_graph_nodes(ctx.registry()));
    tracing::info!(
        langlinks = starting_page.langlinks().len(),
        "fetched starting page langlinks"
    );

    let versions = starting_page.all_language_versions(ctx.registry());
    fetch_links_batch(ctx, &versions).await?;

    for page in &versions {
        fold_links(&mut graph, ctx, page);
    }
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "language graph assembled"
    );
    Ok(graph)
}

/// Build the graph as it stood at `moment`.
///
/// Languages without a revision at or before `moment` are skipped.
#[tracing::instrument(skip_all, fields(start = %starting_page.identity(), %moment))]
pub async fn generate_lang_graph_at(
    ctx: &FetchContext,
    mut graph: LangGraph,
    starting_page: &Arc<Page>,
    moment: OffsetDateTime,
    languages: Option<&[String]>,
) -> LangGraphResult<LangGraph> {
    fetch_starting_page(ctx, starting_page).await?;
    starting_page.fetch_langlinks(ctx, None, true).await?;

    let timeline = starting_page.timepoints_by_language(ctx.registry());
    let mut snapshots = Vec::new();
    for (language, revisions) in &timeline {
        if !language_allowed(languages, language) {
            continue;
        }
        match revisions.at_or_before(moment) {
            Some(rev) => snapshots.push(ctx.registry().historical(rev)),
            None => tracing::warn!(
                %language,
                title = starting_page.title(),
                "article not available in this language at the requested moment, skipping"
            ),
        }
    }

    let avoid = ctx.config().links.avoid_substring.clone();
    join_batch(snapshots.iter().map(|page| {
        let page = Arc::clone(page);
        let ctx = ctx.clone();
        let avoid = avoid.clone();
        async move {
            page.fetch_page(&ctx, true).await?;
            page.fetch_links(&ctx, &avoid).await
        }
    }))
    .await?;

    for page in snapshots.iter().filter(|p| p.is_valid()) {
        add_page_to_graph(&mut graph, page);
        fold_links(&mut graph, ctx, page);
    }
    tracing::info!(
        snapshots = snapshots.len(),
        nodes = graph.node_count(),
        "point-in-time graph assembled"
    );
    Ok(graph)
}

async fn fetch_starting_page(ctx: &FetchContext, page: &Arc<Page>) -> LangGraphResult<()> {
    page.fetch_page(ctx, true).await?;
    if !page.is_valid() {
        return Err(LangGraphError::not_found(format!(
            "article {} does not exist",
            page.identity()
        )));
    }
    tracing::info!(wikibase_item = ?page.wikibase_item(), "fetched starting page");
    Ok(())
}

fn add_page_to_graph(graph: &mut LangGraph, page: &Page) {
    match page.wikibase_item() {
        Some(item) => {
            graph.add_node(item, page.summary());
        }
        None => tracing::error!(page = %page.identity(), "page has no wikibase item, not added"),
    }
}

async fn fetch_links_batch(ctx: &FetchContext, pages: &[Arc<Page>]) -> LangGraphResult<()> {
    let avoid = ctx.config().links.avoid_substring.clone();
    join_batch(pages.iter().map(|page| {
        let page = Arc::clone(page);
        let ctx = ctx.clone();
        let avoid = avoid.clone();
        async move { page.fetch_links(&ctx, &avoid).await }
    }))
    .await
}

fn fold_links(graph: &mut LangGraph, ctx: &FetchContext, page: &Page) {
    graph.add_nodes_from(page.links_as_graph_nodes(ctx.registry()));
    graph.add_edges_from(page.links_as_graph_edges(ctx.registry()));
}

fn language_allowed(languages: Option<&[String]>, language: &str) -> bool {
    match languages {
        Some(allowed) if !allowed.is_empty() => allowed.iter().any(|l| l == language),
        _ => true,
    }
}
