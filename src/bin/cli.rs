//! Lineage CLI - explore a lineage fixture from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lineage::cli::{commands, Cli};
use lineage::{EntryRef, FixtureFetcher, LineageConfig, LineageSession};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LineageConfig::load(path),
        None => LineageConfig::default(),
    };

    // Logs go to stderr; stdout carries the JSON result only.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("lineage=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let fetcher = FixtureFetcher::from_path(&cli.fixture)
        .with_context(|| format!("Failed to load fixture {:?}", cli.fixture))?;
    let session = LineageSession::open(
        Arc::new(fetcher),
        config,
        EntryRef::from_fqn(cli.anchor.as_str()),
    )
    .await
    .context("Failed to open lineage session")?;

    let output = commands::run(Arc::new(session), cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
