//! Atomic publication point for snapshots.
//!
//! Readers call [`SnapshotStore::load`] and keep the returned `Arc` for as
//! long as they need a consistent view. The refresh loop is the only writer;
//! a publish swaps one pointer, so a reader sees either the old snapshot or
//! the new one, never a mix.

use super::snapshot::Snapshot;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<Snapshot>,
    generation: AtomicU64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, or `None` before the first publish.
    #[inline]
    pub fn load(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Generation of the current snapshot; zero before the first publish.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stamp the next generation on `snapshot` and make it current.
    ///
    /// Assumes a single writer.
    pub fn store(&self, mut snapshot: Snapshot) -> u64 {
        let generation = self.generation.load(Ordering::Acquire) + 1;
        snapshot.generation = generation;
        self.current.store(Some(Arc::new(snapshot)));
        self.generation.store(generation, Ordering::Release);
        generation
    }
}
