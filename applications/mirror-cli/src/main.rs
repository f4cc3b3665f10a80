/// Mirror - incremental backup of remote sources to local storage
mod config;

use clap::{Parser, Subcommand};
use crate::config::MirrorConfig;
use mirror_sync::{MirrorError, Registry, SyncedFile, WriteOutcome};
use mirror_tumblr::TumblrHandler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mirror", version)]
#[command(about = "Incrementally mirror a remote source to local storage", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./mirror.toml when present)
    #[arg(short, long, global = true, env = "MIRROR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror everything under FROM into the TO directory
    Sync {
        /// Source locator, e.g. tumblr://dashboard/ or tumblr://dashboard/staff.tumblr.com
        from: String,
        /// Local destination directory
        to: PathBuf,
    },
    /// Load and validate the configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirror=info,mirror_sync=info,mirror_tumblr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = MirrorConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Sync { from, to } => {
            let failures = run_sync(&config, &from, &to).await?;
            if failures > 0 {
                anyhow::bail!("sync finished with {} error(s)", failures);
            }
        }
        Commands::CheckConfig => {
            println!("Configuration OK");
            println!("{:#?}", config);
        }
    }

    Ok(())
}

/// Run one sync to completion and return the number of errors reported
async fn run_sync(config: &MirrorConfig, from: &str, to: &Path) -> anyhow::Result<usize> {
    let handler = TumblrHandler::new(config.tumblr.clone())?;
    let registry = Registry::new().with_scheme("tumblr", Arc::new(handler));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping sync");
                cancel.cancel();
            }
        }
    });

    let options = config.sync_options().with_cancel(cancel);
    let streams = mirror_sync::sync_with_options(from, to, registry, options)?;

    tracing::info!(from = %from, to = %to.display(), "Sync started");

    let report = streams.drain_with(log_synced, log_error).await;
    let summary = report.summary();

    tracing::info!(
        synced = summary.files_synced,
        written = summary.files_written,
        skipped = summary.files_skipped,
        bytes = summary.bytes_written,
        errors = summary.errors_encountered,
        "Sync finished"
    );

    println!(
        "{} files synced ({} written, {} unchanged, {} bytes), {} errors",
        summary.files_synced,
        summary.files_written,
        summary.files_skipped,
        summary.bytes_written,
        summary.errors_encountered
    );

    Ok(summary.errors_encountered)
}

fn log_synced(file: &SyncedFile) {
    match file.outcome {
        WriteOutcome::Written { bytes } => {
            tracing::info!(path = %file.path.display(), bytes, "Wrote file");
        }
        WriteOutcome::Skipped => {
            tracing::debug!(path = %file.path.display(), "Up to date");
        }
    }
}

fn log_error(error: &MirrorError) {
    if error.is_fatal() {
        tracing::warn!(error = %error, "Sync stopped");
    } else {
        tracing::error!(error = %error, "Sync error");
    }
}
