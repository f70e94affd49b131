use anyhow::{Context, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use langgraph_core::config::CrawlConfig;

use super::graph::GraphOut;
use crate::output;

pub async fn run(cfg: CrawlConfig, title: &str, language: &str, at: &str, full: bool) -> Result<()> {
    let moment = OffsetDateTime::parse(at, &Rfc3339)
        .with_context(|| format!("--at must be an RFC 3339 timestamp, got {at:?}"))?;
    let mut model = super::model(cfg)?;

    let pb = output::spinner(&format!("rebuilding {language}:{title} as of {at}"));
    let data = model.get_article_timestamp(title, moment, language).await;
    pb.finish_and_clear();

    output::print(&GraphOut::from_data(title, language, &data?, full))
}
