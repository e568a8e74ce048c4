use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use shelfsync_core::{
    config::{self, AppConfig},
    CoverArtResolver, ExportPass, ExportStatus, IgdbClient, JsonLibrary, Progress, RunContext,
    SnapshotStore,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Mirror a game library into a JSON snapshot with cover art.
#[derive(Debug, Parser)]
#[command(name = "shelfsync", version)]
struct Cli {
    /// Configuration file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Library dump to export.
    #[arg(long)]
    library: Option<PathBuf>,
    /// Snapshot file to write.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Skip metadata lookups; use storefront or placeholder artwork.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };
    if let Some(library) = cli.library {
        config.library_path = library;
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = snapshot;
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("cancellation requested, stopping after the current game");
            on_ctrl_c.cancel();
        }
    });

    let offline = cli.offline;
    let status = tokio::task::spawn_blocking(move || run_export(&config, offline, &cancel))
        .await
        .context("export task panicked")?;

    println!("{status}");
    Ok(match status {
        ExportStatus::Failed(_) => ExitCode::FAILURE,
        ExportStatus::Cancelled { .. } => ExitCode::from(130),
        ExportStatus::Completed { .. } => ExitCode::SUCCESS,
    })
}

/// Blocking export pass; the metadata client must be created off the async
/// runtime.
fn run_export(config: &AppConfig, offline: bool, cancel: &CancellationToken) -> ExportStatus {
    let library = match JsonLibrary::open(&config.library_path) {
        Ok(library) => library,
        Err(err) => {
            error!("Failed to export games: {err:#}");
            return ExportStatus::Failed(format!("{err:#}"));
        }
    };

    let ctx = if offline {
        RunContext::offline("disabled by --offline")
    } else {
        match IgdbClient::from_config(&config.metadata) {
            Ok(client) => RunContext::begin(Box::new(client)),
            Err(err) => RunContext::offline(err.to_string()),
        }
    };

    let pass = ExportPass::new(
        SnapshotStore::new(config.snapshot_path.clone()),
        CoverArtResolver::new(config.artwork.placeholder_url.clone()),
    );
    pass.run(&library, ctx, cancel, report_progress)
}

fn report_progress(progress: Progress) {
    if progress.processed % 25 == 0 || progress.processed == progress.total {
        info!("Processed {}/{} games", progress.processed, progress.total);
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("shelfsync.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
