//! Progress counters for a dispatch run.
//!
//! Each counter has exactly one writer: the admission scheduler owns
//! `admitted`, `admission_ticks` and `largest_batch`; the completion tracker
//! owns `completed` and `skipped`. Readers only take relaxed snapshots.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Items the run is configured for.
    pub total: usize,
    /// Indices pushed onto the work queue.
    pub admitted: usize,
    /// Items whose post step succeeded.
    pub completed: usize,
    /// Items whose post step failed and were skipped by policy.
    pub skipped: usize,
    /// Ticks that admitted at least one index.
    pub admission_ticks: u64,
    /// Largest number of indices admitted on a single tick.
    pub largest_batch: usize,
}

impl DispatchStats {
    /// Items completed or skipped.
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.completed + self.skipped
    }
}

/// Live counters backing [`DispatchStats`].
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    pub total: AtomicUsize,
    pub admitted: AtomicUsize,
    pub completed: AtomicUsize,
    pub skipped: AtomicUsize,
    pub admission_ticks: AtomicU64,
    pub largest_batch: AtomicUsize,
}

impl DispatchCounters {
    /// Zero every counter for a new run.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.admitted.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.admission_ticks.store(0, Ordering::Relaxed);
        self.largest_batch.store(0, Ordering::Relaxed);
    }

    /// Get a snapshot of current progress.
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            total: self.total.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            admission_ticks: self.admission_ticks.load(Ordering::Relaxed),
            largest_batch: self.largest_batch.load(Ordering::Relaxed),
        }
    }
}
