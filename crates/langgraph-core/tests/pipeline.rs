//! pipeline.rs
//!
//! Drives the full current-graph pipeline against an in-memory API:
//! fetch, dedup, langlink restriction, link filtering and metrics.

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;

use langgraph_core::graph::{is_language_root, Side};
use langgraph_core::prelude::*;

fn cedynia() -> FixtureApi {
    FixtureApi::new()
        .with_page(
            "pl",
            FixturePage::new("Bitwa pod Cedynią", "Q474546")
                .redirect("Bitwa cedyńska")
                .description("bitwa z 972 roku")
                .links(["Mieszko I", "Hodo", "Cedynia", "Kategoria:Bitwy", "Usunięta strona"])
                .langlink("en", "Battle of Cedynia")
                .langlink("de", "Schlacht bei Zehden")
                .revision(100, "2006-03-01T12:00:00Z")
                .revision(101, "2014-07-15T08:30:00Z"),
        )
        .with_page(
            "en",
            FixturePage::new("Battle of Cedynia", "Q474546")
                .links(["Mieszko I", "Hodo", "Holy Roman Empire"])
                .revision(200, "2008-05-05T00:00:00Z"),
        )
        .with_page(
            "de",
            FixturePage::new("Schlacht bei Zehden", "Q474546")
                .links(["Mieszko I.", "Hodo (Markgraf)"])
                .revision(300, "2010-10-10T00:00:00Z"),
        )
        .with_page("pl", FixturePage::new("Mieszko I", "Q53435"))
        .with_page("pl", FixturePage::new("Hodo", "Q61470"))
        .with_page("pl", FixturePage::new("Cedynia", "Q1005486"))
        .with_page("en", FixturePage::new("Mieszko I", "Q53435"))
        .with_page("en", FixturePage::new("Hodo", "Q61470"))
        .with_page("en", FixturePage::new("Holy Roman Empire", "Q12548"))
        .with_page("de", FixturePage::new("Mieszko I.", "Q53435"))
        .with_page("de", FixturePage::new("Hodo (Markgraf)", "Q61470"))
}

fn context(api: &Arc<FixtureApi>) -> FetchContext {
    FetchContext::new(api.clone(), CrawlConfig::default())
}

#[tokio::test]
async fn starting_root_has_every_valid_internal_link() {
    let api = Arc::new(cedynia());
    let ctx = context(&api);
    let start = ctx.page("Bitwa pod Cedynią", "pl");
    let graph = generate_lang_graph(&ctx, LangGraph::new(), &start, None)
        .await
        .unwrap();

    let valid_links = start.links().len();
    assert_eq!(valid_links, 3);
    assert!(graph.neighbors("Q474546__pl").unwrap().len() >= valid_links);

    let table = calculate_dissimilarity_metrics(&graph);
    let roots = graph.left_nodes().count();
    assert_eq!(roots, 3);
    assert_eq!(table.len(), roots * (roots - 1));
}

#[tokio::test]
async fn every_page_is_fetched_once() {
    let api = Arc::new(cedynia());
    let ctx = context(&api);
    let start = ctx.page("Bitwa pod Cedynią", "pl");
    generate_lang_graph(&ctx, LangGraph::new(), &start, None)
        .await
        .unwrap();

    assert_eq!(api.requests("pl", "Bitwa pod Cedynią"), 1);
    assert_eq!(api.requests("pl", "Mieszko I"), 1);
    assert_eq!(api.requests("en", "Mieszko I"), 1);
    // Namespace pages are never requested.
    assert_eq!(api.requests("pl", "Kategoria:Bitwy"), 0);

    // Fetching again goes through the registry, not the network.
    let before = api.total_requests();
    start.fetch_page(&ctx, true).await.unwrap();
    start.fetch_links(&ctx, ":").await.unwrap();
    assert_eq!(api.total_requests(), before);
}

#[tokio::test]
async fn redirect_alias_resolves_to_fetched_page() {
    let api = Arc::new(cedynia());
    let ctx = context(&api);
    let start = ctx.page("Bitwa pod Cedynią", "pl");
    start.fetch_page(&ctx, true).await.unwrap();

    let alias = ctx.page("Bitwa cedyńska", "pl");
    assert!(Arc::ptr_eq(&alias, &start));
    assert_eq!(alias.description().as_deref(), Some("bitwa z 972 roku"));
}

#[tokio::test]
async fn graph_partition_holds() {
    let api = Arc::new(cedynia());
    let ctx = context(&api);
    let start = ctx.page("Bitwa pod Cedynią", "pl");
    let graph = generate_lang_graph(&ctx, LangGraph::new(), &start, None)
        .await
        .unwrap();

    for (key, _) in graph.nodes() {
        let side = Side::of(key);
        assert_eq!(side == Side::Left, is_language_root(key));
    }
    for (a, b) in graph.edges() {
        assert_ne!(is_language_root(a), is_language_root(b), "edge {a} - {b}");
    }
}

#[tokio::test]
async fn excluding_a_language_removes_its_root() {
    let api = Arc::new(cedynia());
    let ctx = context(&api);
    let start = ctx.page("Bitwa pod Cedynią", "pl");
    let languages = vec!["pl".to_string(), "de".to_string()];
    let graph = generate_lang_graph(&ctx, LangGraph::new(), &start, Some(languages.as_slice()))
        .await
        .unwrap();

    assert!(graph.left_nodes().all(|k| !k.ends_with("__en")));
    assert!(!graph.contains_node("Q12548"));
    assert_eq!(api.requests("en", "Battle of Cedynia"), 0);
}

#[tokio::test]
async fn nonexistent_links_leave_no_trace() {
    let api = Arc::new(cedynia());
    let ctx = context(&api);
    let start = ctx.page("Bitwa pod Cedynią", "pl");
    generate_lang_graph(&ctx, LangGraph::new(), &start, None)
        .await
        .unwrap();

    let gone = PageKey::new("Usunięta strona", "pl");
    assert!(!start.links().contains(&gone));

    let mut keys: PageKeySet = [gone].into_iter().collect();
    keys.remove_nonexistent(ctx.registry());
    assert!(keys.is_empty());
    assert_eq!(keys.graph_nodes(ctx.registry()).count(), 0);
}

#[tokio::test]
async fn merge_conflict_aborts_the_build() {
    let first = json!({
        "continue": {"plcontinue": "1|0|B", "continue": "||"},
        "query": {"pages": {"1": {"title": "A", "pageprops": {"wikibase_item": "Q1"}}}}
    });
    let second = json!({
        "query": {"pages": {"1": {"title": "A", "pageprops": {"wikibase_item": "Q2"}}}}
    });
    let api = Arc::new(FixtureApi::new().with_fragments("pl", "A", vec![first, second]));
    let ctx = context(&api);
    let start = ctx.page("A", "pl");

    let err = generate_lang_graph(&ctx, LangGraph::new(), &start, None)
        .await
        .unwrap_err();
    assert_matches!(err, LangGraphError::MergeConflict { ref path, .. } if path.ends_with("wikibase_item"));
}

#[tokio::test]
async fn timeline_spans_all_languages() {
    let api = Arc::new(cedynia());
    let mut model = Model::new(api.clone(), CrawlConfig::default()).unwrap();
    let data = model.get_article_data("Bitwa pod Cedynią", "pl").await.unwrap();

    let ids: Vec<_> = data.timestamps.iter().map(|k| k.oldid.as_str()).collect();
    assert_eq!(ids, vec!["101", "300", "200", "100"]);

    let by_lang = data.timestamps.by_language();
    assert_eq!(by_lang["pl"].len(), 2);
    assert_eq!(by_lang["de"].latest().unwrap().oldid, "300");

    let export = data.network.to_json();
    assert_eq!(export["counts"]["left"], 3);
}
