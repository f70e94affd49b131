use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::Serialize;

use langgraph_core::config::CrawlConfig;
use langgraph_core::keys::RevisionKey;
use langgraph_core::page::FetchContext;

use crate::output;

#[derive(Debug, Serialize)]
pub struct TimelineOut {
    pub title: String,
    pub language: String,
    pub total: usize,
    pub by_language: BTreeMap<String, Vec<RevisionKey>>,
}

pub async fn run(cfg: CrawlConfig, title: &str, language: &str) -> Result<()> {
    let api = super::http_api(&cfg)?;
    let ctx = FetchContext::new(api, cfg);
    let page = ctx.page(title, language);

    let pb = output::spinner(&format!("fetching revision history of {language}:{title}"));
    let fetched = async {
        page.fetch_page(&ctx, true).await?;
        page.fetch_langlinks(&ctx, None, true).await
    }
    .await;
    pb.finish_and_clear();
    fetched?;

    if !page.is_valid() {
        bail!("article {language}:{title} not found");
    }

    let grouped = page.timepoints_by_language(ctx.registry());
    let out = TimelineOut {
        title: title.to_string(),
        language: language.to_string(),
        total: grouped.values().map(|r| r.len()).sum(),
        by_language: grouped
            .into_iter()
            .map(|(lang, revs)| (lang, revs.into_iter().collect()))
            .collect(),
    };
    output::print(&out)
}
