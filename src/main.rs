use anyhow::{Context, Result};
use clap::Parser;
use sotwe_feed::{AppConfig, FeedFetcher, Identity, SotweFetcher};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sotwe-feed")]
#[command(about = "Print a Sotwe user timeline as a JSON feed", long_about = None)]
struct Cli {
    /// Twitter username, e.g. _RSSHub
    id: String,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("sotwe_feed=debug,info")
    } else {
        EnvFilter::new("sotwe_feed=info,warn")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match cli.config.or_else(AppConfig::default_path) {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::from_env(),
    };

    let user = Identity::parse(&cli.id)?;
    let fetcher = SotweFetcher::new(&config);
    let feed = fetcher
        .fetch(&user)
        .await
        .with_context(|| format!("fetching timeline for {}", user))?;

    println!("{}", serde_json::to_string_pretty(&feed)?);
    Ok(())
}
