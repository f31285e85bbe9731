//! Background refresh loop.
//!
//! ```text
//!  tick ──▶ Mirror::sync ──▶ load_snapshot ──▶ SnapshotStore::store
//!   ▲            │ err              │ err
//!   │            ▼                  ▼
//!   └──── log, keep serving the previous snapshot
//! ```
//!
//! A cycle is blocking work and runs on tokio's blocking pool. The loop awaits
//! it before waiting for the next tick, so cycles never overlap; ticks missed
//! while a slow cycle ran are skipped rather than replayed.

use crate::content::{LoadError, SnapshotStore, load_snapshot};
use crate::log;
use crate::mirror::{Mirror, SyncError, SyncStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("content sync failed")]
    Sync(#[from] SyncError),

    #[error("content reload failed")]
    Load(#[from] LoadError),
}

/// What one successful cycle published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub status: SyncStatus,
    pub generation: u64,
    pub posts: usize,
    pub projects: usize,
}

// ============================================================================
// Shutdown signal
// ============================================================================

/// Raises the shutdown signal. Dropping it counts as raising it.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

/// Observes the shutdown signal; cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // No receivers left means nobody is waiting; nothing to do.
        let _ = self.0.send(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once shutdown is raised.
    pub async fn wait(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

// ============================================================================
// Refresher
// ============================================================================

#[derive(Debug)]
pub struct Refresher {
    mirror: Mirror,
    content_root: PathBuf,
    store: Arc<SnapshotStore>,
    interval: Duration,
}

impl Refresher {
    pub fn new(mirror: Mirror, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        let content_root = mirror.dir().to_path_buf();
        Self {
            mirror,
            content_root,
            store,
            interval,
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Sync, load and publish once. Blocking.
    ///
    /// On error nothing is published and the store keeps its current snapshot.
    pub fn cycle(&self) -> Result<CycleReport, CycleError> {
        let status = self.mirror.sync()?;
        let snapshot = load_snapshot(&self.content_root)?;

        let posts = snapshot.posts().len();
        let projects = snapshot.projects().len();
        let summary = snapshot.summary();
        let generation = self.store.store(snapshot);

        log!("load"; "generation {generation}: {summary}");
        Ok(CycleReport {
            status,
            generation,
            posts,
            projects,
        })
    }

    /// First cycle at startup; the caller treats failure as fatal.
    pub fn initial_load(&self) -> Result<CycleReport, CycleError> {
        log!("refresh"; "initial load from {}", self.content_root.display());
        let report = self.cycle()?;
        log!("sync"; "{}", report.status);
        Ok(report)
    }

    /// Refresh every `interval` until `shutdown` is raised.
    ///
    /// A cycle in flight when shutdown arrives is abandoned, not awaited.
    pub async fn run(self: Arc<Self>, shutdown: Shutdown) {
        log!("refresh"; "refreshing every {:?}", self.interval);
        let interval = self.interval;
        drive(interval, shutdown, move || self.cycle()).await;
        log!("refresh"; "stopped");
    }
}

/// Tick loop around a blocking `cycle`. The next tick is only awaited once
/// the previous cycle has returned.
async fn drive<F>(interval: Duration, mut shutdown: Shutdown, cycle: F)
where
    F: Fn() -> Result<CycleReport, CycleError> + Send + Sync + 'static,
{
    let cycle = Arc::new(cycle);
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }

        let cycle = Arc::clone(&cycle);
        let running = tokio::task::spawn_blocking(move || cycle());

        tokio::select! {
            biased;
            () = shutdown.wait() => {
                log!("refresh"; "shutdown during a cycle, abandoning it");
                break;
            }
            joined = running => match joined {
                Ok(Ok(report)) => {
                    if report.status.changed() {
                        log!("sync"; "{}", report.status);
                    }
                }
                Ok(Err(err)) => log_cycle_error(err),
                Err(err) => log!("error"; "refresh cycle panicked: {err}"),
            }
        }
    }
}

fn log_cycle_error(err: CycleError) {
    let err = anyhow::Error::from(err);
    log!("error"; "{err:#}; still serving the previous snapshot");
}
