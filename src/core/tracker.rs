//! Completion tracker: counts settled items and owns the stop trigger.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::core::outcome::{ItemFailure, ItemOutcome};
use crate::core::stats::DispatchCounters;
use crate::core::stop::StopTrigger;

/// How the tracker ended the run.
#[derive(Debug)]
pub(crate) enum RunEnd {
    /// Every item completed or was skipped.
    Settled,
    /// The failure policy aborted the run on this item.
    Aborted(ItemFailure),
    /// All workers dropped their completion senders first.
    WorkersExited,
}

/// Tracker result handed back to the dispatcher.
#[derive(Debug)]
pub(crate) struct TrackerReport {
    pub completed: usize,
    pub skipped: Vec<ItemFailure>,
    pub end: RunEnd,
}

/// Single consumer of the completion queue and sole writer of the completion
/// count. Fires the stop signal exactly once, when the run settles or aborts.
pub(crate) struct CompletionTracker {
    total: usize,
    completion_rx: Receiver<ItemOutcome>,
    trigger: StopTrigger,
    counters: Arc<DispatchCounters>,
}

impl CompletionTracker {
    pub const fn new(
        total: usize,
        completion_rx: Receiver<ItemOutcome>,
        trigger: StopTrigger,
        counters: Arc<DispatchCounters>,
    ) -> Self {
        Self {
            total,
            completion_rx,
            trigger,
            counters,
        }
    }

    /// Drain outcomes until the run settles, aborts, or loses its workers.
    pub fn run(mut self) -> TrackerReport {
        let mut completed = 0usize;
        let mut skipped: Vec<ItemFailure> = Vec::new();

        let end = loop {
            if completed + skipped.len() >= self.total {
                break RunEnd::Settled;
            }
            match self.completion_rx.recv() {
                Ok(ItemOutcome::Completed { index }) => {
                    completed += 1;
                    self.counters.completed.store(completed, Ordering::Relaxed);
                    debug!(index, completed, total = self.total, "item completed");
                }
                Ok(ItemOutcome::Skipped(failure)) => {
                    skipped.push(failure);
                    self.counters.skipped.store(skipped.len(), Ordering::Relaxed);
                }
                Ok(ItemOutcome::Aborted(failure)) => break RunEnd::Aborted(failure),
                Err(_) => break RunEnd::WorkersExited,
            }
        };

        if self.trigger.fire() {
            info!(completed, skipped = skipped.len(), total = self.total, "stop signal fired");
        }

        TrackerReport {
            completed,
            skipped,
            end,
        }
    }
}
