use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "langgraph", version, about = "Wikipedia language graph explorer")]
pub struct Cli {
    /// Emit compact JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Give up after this many retries of a transient network fault (default: never).
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Crawl configuration file (JSON).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// An article in one language edition.
#[derive(Args, Debug, Clone)]
pub struct Article {
    /// Article title.
    pub title: String,

    /// Language edition code.
    #[arg(long, default_value = "pl")]
    pub lang: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the language graph and dissimilarity metrics.
    Graph {
        #[command(flatten)]
        article: Article,

        /// Restrict language roots, e.g. `pl,en,de`.
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,

        /// Include every node and edge in the output.
        #[arg(long)]
        full: bool,
    },

    /// Build the graph as it stood at a past moment.
    Snapshot {
        #[command(flatten)]
        article: Article,

        /// RFC 3339 moment, e.g. `2015-06-01T00:00:00Z`.
        #[arg(long)]
        at: String,

        #[arg(long)]
        full: bool,
    },

    /// List revisions of every language version, grouped by language.
    Timeline {
        #[command(flatten)]
        article: Article,
    },

    /// Check whether an article exists.
    Exists {
        #[command(flatten)]
        article: Article,
    },
}
