//! Folio - a live mirror of a git content repository.
//!
//! Folio keeps a shallow local clone of one branch, parses its markdown and
//! YAML documents into an immutable [`Snapshot`], and republishes a fresh
//! snapshot on a fixed interval. Readers take the current snapshot from a
//! shared [`SnapshotStore`] without locking:
//!
//! ```ignore
//! let store = Arc::new(SnapshotStore::new());
//! let refresher = Arc::new(Refresher::new(mirror, Arc::clone(&store), interval));
//! refresher.initial_load()?;
//! tokio::spawn(refresher.run(shutdown));
//!
//! if let Some(snapshot) = store.load() {
//!     for post in snapshot.posts_tagged("rust") { /* ... */ }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod logger;
pub mod mirror;
pub mod refresh;
pub mod utils;

pub use content::{Snapshot, SnapshotStore};
pub use mirror::{Mirror, SyncStatus};
pub use refresh::{Refresher, Shutdown, ShutdownTrigger, shutdown_channel};
