// file: src/index/stats.rs
// description: counters for article index rebuilds, updates and fallbacks
// reference: atomic counters shared across worker tasks

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatsSnapshot {
    pub rebuilds: usize,
    pub updates: usize,
    pub invalidations: usize,
    /// Files whose title or dirty flag fell back to the default.
    pub fallbacks: usize,
}

#[derive(Debug, Default)]
pub struct IndexStats {
    rebuilds: AtomicUsize,
    updates: AtomicUsize,
    invalidations: AtomicUsize,
    fallbacks: AtomicUsize,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_rebuilds(&self) {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_updates(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalidations(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_fallbacks(&self, count: usize) {
        self.fallbacks.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IndexStatsSnapshot {
        IndexStatsSnapshot {
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}
