//! Admission scheduler: releases indices onto the work queue at a fixed cadence.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, tick, Sender};
use tracing::debug;

use crate::core::stats::DispatchCounters;
use crate::core::stop::StopSignal;

/// Sole owner of `next_index`.
///
/// Every tick admits `min(batch_size, total - next_index)` indices in
/// increasing order. Both the wait for the next tick and every push onto a
/// full work queue race against the stop signal. Once every index is admitted
/// the scheduler drops its ticker and queue sender and returns; workers then
/// drain what is left and exit when the queue reports disconnected.
pub(crate) struct AdmissionScheduler {
    interval: Duration,
    total: usize,
    batch_size: usize,
    work_tx: Sender<usize>,
    stop: StopSignal,
    counters: Arc<DispatchCounters>,
}

impl AdmissionScheduler {
    pub const fn new(
        interval: Duration,
        total: usize,
        batch_size: usize,
        work_tx: Sender<usize>,
        stop: StopSignal,
        counters: Arc<DispatchCounters>,
    ) -> Self {
        Self {
            interval,
            total,
            batch_size,
            work_tx,
            stop,
            counters,
        }
    }

    /// Admit until every index is queued or the run stops. Returns the number
    /// of indices admitted.
    pub fn run(self) -> usize {
        let Self {
            interval,
            total,
            batch_size,
            work_tx,
            stop,
            counters,
        } = self;

        let ticker = tick(interval);
        let mut next_index = 0usize;
        let mut ticks = 0u64;
        let mut largest_batch = 0usize;

        while next_index < total {
            if stop.is_stopped() {
                debug!(admitted = next_index, "admission stopped");
                return next_index;
            }
            select! {
                recv(stop.receiver()) -> _ => {
                    debug!(admitted = next_index, "admission stopped");
                    return next_index;
                }
                recv(ticker) -> _ => {
                    let batch_start = next_index;
                    let batch_end = total.min(next_index.saturating_add(batch_size));
                    while next_index < batch_end {
                        if stop.is_stopped() {
                            debug!(admitted = next_index, "admission stopped mid-batch");
                            return next_index;
                        }
                        select! {
                            send(work_tx, next_index) -> res => {
                                if res.is_err() {
                                    debug!(admitted = next_index, "work queue closed, admission stopped");
                                    return next_index;
                                }
                                next_index += 1;
                                counters.admitted.store(next_index, Ordering::Relaxed);
                            }
                            recv(stop.receiver()) -> _ => {
                                debug!(admitted = next_index, "admission stopped mid-batch");
                                return next_index;
                            }
                        }
                    }

                    let admitted = next_index - batch_start;
                    ticks += 1;
                    largest_batch = largest_batch.max(admitted);
                    counters.admission_ticks.store(ticks, Ordering::Relaxed);
                    counters.largest_batch.store(largest_batch, Ordering::Relaxed);
                    debug!(tick = ticks, admitted, next_index, "batch admitted");
                }
            }
        }

        debug!(admitted = next_index, ticks, "all items admitted");
        next_index
    }
}
