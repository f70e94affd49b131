use anyhow::Result;
use serde::Serialize;

use langgraph_core::config::CrawlConfig;
use langgraph_core::graph::{GraphCounts, GraphExport};
use langgraph_core::metrics::ScoreEntry;
use langgraph_core::model::ArticleData;

use crate::output;

#[derive(Debug, Serialize)]
pub struct GraphOut {
    pub title: String,
    pub language: String,
    pub languages: Vec<String>,
    pub counts: GraphCounts,
    pub revisions: usize,
    pub most_different: Option<ScoreEntry>,
    pub metrics: Vec<ScoreEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphExport>,
}

impl GraphOut {
    pub fn from_data(title: &str, language: &str, data: &ArticleData, full: bool) -> Self {
        let export = data.network.to_export();
        Self {
            title: title.to_string(),
            language: language.to_string(),
            languages: data.network.languages().into_iter().collect(),
            counts: export.counts,
            revisions: data.timestamps.len(),
            most_different: data.metrics.max_pair(),
            metrics: data.metrics.entries(),
            graph: full.then_some(export),
        }
    }
}

pub async fn run(
    cfg: CrawlConfig,
    title: &str,
    language: &str,
    languages: Vec<String>,
    full: bool,
) -> Result<()> {
    let languages = if languages.is_empty() {
        cfg.languages.clone()
    } else {
        Some(languages)
    };
    let mut model = super::model(cfg)?;

    let pb = output::spinner(&format!("building language graph for {language}:{title}"));
    let data = model
        .get_article_data_in(title, language, languages.as_deref())
        .await;
    pb.finish_and_clear();

    output::print(&GraphOut::from_data(title, language, &data?, full))
}
