//! Command-line entry point for mtbs-fetch.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mtbs_fetch::{Cli, FsWriter, HttpFetcher, JsonSink, Orchestrator, WfsCatalog};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<mtbs_fetch::Error>() {
                Some(run_err) => error!(kind = run_err.kind(), "{err:#}"),
                None => error!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config();

    let fetcher = Arc::new(HttpFetcher::new(config.request_timeout, config.max_retry)?);
    let catalog = WfsCatalog::new(fetcher.client().clone(), config.catalog_url.clone());
    let sink = JsonSink::new(FsWriter, config.output.clone());

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(catalog),
        fetcher.clone(),
        Arc::new(FsWriter),
        Arc::new(sink),
    )?;
    let collection = orchestrator.run().await?;

    info!(
        features = collection.len(),
        "Total bytes transferred: {}",
        format_size(fetcher.transferred_bytes())
    );
    Ok(())
}

/// Format a byte count with a binary unit
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
