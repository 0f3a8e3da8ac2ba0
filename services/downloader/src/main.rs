//! GNSS observation and product downloader.
//!
//! Resolves the configured products into ranked remote candidates across the
//! IGS data centers, fetches them with retry and mirror fallback, and leaves
//! decompressed, converted files in the local product tree. Per-file failures
//! are logged and skipped; only configuration problems fail the process.

mod config;
mod runner;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::Config;
use retrieval::{HttpFetcher, JsonlOutcomeSink, OutcomeSink};
use runner::Runner;

#[derive(Parser, Debug)]
#[command(name = "downloader")]
#[command(about = "GNSS observation and product downloader for the IGS data centers")]
struct Args {
    /// Run configuration file
    #[arg(short, long, env = "DOWNLOADER_CONFIG", default_value = "downloader.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(config = %args.config.display(), "Starting GNSS downloader");

    let config = Config::load(&args.config)?;
    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.download_dir.display()))?;

    let fetcher = HttpFetcher::new(config.request_timeout(), config.tools.curl.clone())
        .context("Failed to build HTTP client")?;

    let mut sink: Option<JsonlOutcomeSink> = match &config.log {
        Some(log) => Some(
            JsonlOutcomeSink::open(&log.file, log.mode)
                .with_context(|| format!("Failed to open outcome log {}", log.file.display()))?,
        ),
        None => None,
    };

    let runner = Runner::from_config(&config)?;

    // Ctrl-C stops between day batches; the one in flight completes.
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(()).ok();
    });

    let summary = runner
        .run(
            &fetcher,
            sink.as_mut().map(|s| s as &mut dyn OutcomeSink),
            &mut shutdown_rx,
        )
        .await?;

    if summary.skipped > 0 {
        warn!(
            files = summary.files,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            "Download session complete with skipped files"
        );
    } else {
        info!(
            files = summary.files,
            succeeded = summary.succeeded,
            "Download session complete"
        );
    }
    Ok(())
}
