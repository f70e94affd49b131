use std::sync::Arc;

use anyhow::Result;
use langgraph_core::api::HttpWikiApi;
use langgraph_core::config::CrawlConfig;
use langgraph_core::model::Model;

use crate::args::{Cli, Command};
use crate::settings;

mod exists;
mod graph;
mod snapshot;
mod timeline;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let cfg = settings::load(cli.config.as_deref(), cli.max_retries)?;
    match cli.command {
        Command::Graph {
            article,
            languages,
            full,
        } => graph::run(cfg, &article.title, &article.lang, languages, full).await,
        Command::Snapshot { article, at, full } => {
            snapshot::run(cfg, &article.title, &article.lang, &at, full).await
        }
        Command::Timeline { article } => timeline::run(cfg, &article.title, &article.lang).await,
        Command::Exists { article } => exists::run(cfg, &article.title, &article.lang).await,
    }
}

/// One HTTP client per command invocation.
fn http_api(cfg: &CrawlConfig) -> Result<Arc<HttpWikiApi>> {
    Ok(Arc::new(HttpWikiApi::new(&cfg.api)?))
}

fn model(cfg: CrawlConfig) -> Result<Model> {
    let api = http_api(&cfg)?;
    Ok(Model::new(api, cfg)?)
}
