//! Folio - keeps a git content repository parsed in memory and fresh.

use anyhow::{Context, Result};
use clap::Parser;
use folio::cli::{Cli, Commands};
use folio::config::FolioConfig;
use folio::content::load_snapshot;
use folio::{Refresher, SnapshotStore, log, shutdown_channel};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How long a cycle abandoned at shutdown may keep the process alive.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Check { dir } => check(dir),
        Commands::Sync { .. } => {
            let refresher = build_refresher(&FolioConfig::load(&cli)?)?;
            refresher.initial_load().context("Content sync failed")?;
            Ok(())
        }
        Commands::Run { .. } => run(&FolioConfig::load(&cli)?),
    }
}

fn build_refresher(config: &FolioConfig) -> Result<Refresher> {
    Ok(Refresher::new(
        config.mirror()?,
        Arc::new(SnapshotStore::new()),
        config.interval()?,
    ))
}

/// Initial load (fatal on failure), then refresh until Ctrl+C.
fn run(config: &FolioConfig) -> Result<()> {
    let refresher = Arc::new(build_refresher(config)?);
    refresher
        .initial_load()
        .context("Initial content load failed")?;

    let (trigger, shutdown) = shutdown_channel();
    ctrlc::set_handler(move || {
        log!("refresh"; "shutting down...");
        trigger.trigger();
    })
    .context("Failed to set Ctrl+C handler")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(Arc::clone(&refresher).run(shutdown));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    Ok(())
}

/// Load a local directory without git and print what it contains.
fn check(dir: &Path) -> Result<()> {
    let snapshot = load_snapshot(dir)
        .with_context(|| format!("Failed to load content from `{}`", dir.display()))?;

    for post in snapshot.posts() {
        let date = post.date().map(|d| d.to_string()).unwrap_or_else(|| "undated".into());
        log!("check"; "post    {date:<10} {} ({})", post.slug, post.title());
    }
    for project in snapshot.projects() {
        let marker = if project.meta.featured { "*" } else { " " };
        log!("check"; "project {marker} {}", project.slug);
    }
    log!("check"; "{}", snapshot.summary());

    Ok(())
}
