use anyhow::Result;
use clap::Parser;

mod args;
mod cmd;
mod output;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = args::Cli::parse();
    output::init(cli.json);
    init_tracing(cli.log_json);

    cmd::dispatch(cli).await
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` overrides the default level.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
