use anyhow::Result;
use serde::Serialize;

use langgraph_core::config::CrawlConfig;

use crate::output;

#[derive(Debug, Serialize)]
pub struct ExistsOut {
    pub title: String,
    pub language: String,
    pub exists: bool,
}

pub async fn run(cfg: CrawlConfig, title: &str, language: &str) -> Result<()> {
    let model = super::model(cfg)?;
    let exists = model.check_article_exists(title, language).await?;
    output::print(&ExistsOut {
        title: title.to_string(),
        language: language.to_string(),
        exists,
    })
}
