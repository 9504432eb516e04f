//! Worker pool with dedicated OS threads.
//!
//! Each worker owns a single-threaded tokio runtime so the async callbacks run
//! off the caller's runtime, and blocks in `crossbeam_channel::select!` on
//! either the stop signal or the next index from the work queue.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel selects; shutdown is a channel close
//! - **No shared mutable state**: workers only talk through the two queues
//! - **Bounded shutdown**: `join_workers` waits a grace period, then detaches

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver, Sender};
use tracing::{debug, error, warn, Span};

use crate::config::TargetSet;
use crate::core::error::DispatchError;
use crate::core::generator::{ItemGenerator, PostProcessor};
use crate::core::outcome::{ItemFailure, ItemOutcome};
use crate::core::policy::{FailureAction, FailurePolicy};
use crate::core::stop::StopSignal;

/// Everything one worker thread needs.
pub(crate) struct WorkerContext<P, G, R> {
    pub targets: TargetSet,
    pub params: Arc<P>,
    pub generator: G,
    pub post: R,
    pub policy: Arc<dyn FailurePolicy>,
    pub work_rx: Receiver<usize>,
    pub completion_tx: Sender<ItemOutcome>,
    pub stop: StopSignal,
    pub exited_tx: Sender<usize>,
    pub span: Span,
}

/// Reports a worker's exit, including exit by panic.
struct ExitNotice {
    worker_id: usize,
    tx: Sender<usize>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.tx.send(self.worker_id);
    }
}

/// Spawn a worker thread.
pub(crate) fn spawn_worker<P, G, R>(
    worker_id: usize,
    ctx: WorkerContext<P, G, R>,
) -> Result<JoinHandle<()>, DispatchError>
where
    P: Send + Sync + 'static,
    G: ItemGenerator<P>,
    R: PostProcessor,
{
    let name = format!("dispatch-worker-{worker_id}");
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let _exit = ExitNotice {
                worker_id,
                tx: ctx.exited_tx.clone(),
            };
            let span = ctx.span.clone();
            let _entered = span.enter();
            debug!(worker_id, "worker thread started");

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(worker_id, error = %e, "failed to create worker runtime");
                    return;
                }
            };

            loop {
                // select! picks randomly among ready arms; stop wins over queued work.
                if ctx.stop.is_stopped() {
                    debug!(worker_id, "stop observed, exiting");
                    break;
                }
                let index = select! {
                    recv(ctx.stop.receiver()) -> _ => {
                        debug!(worker_id, "stop observed, exiting");
                        break;
                    }
                    recv(ctx.work_rx) -> msg => match msg {
                        Ok(index) => index,
                        Err(_) => {
                            debug!(worker_id, "work queue drained and closed, exiting");
                            break;
                        }
                    },
                };

                let outcome = rt.block_on(process_item(&ctx, worker_id, index));

                select! {
                    send(ctx.completion_tx, outcome) -> res => {
                        if res.is_err() {
                            debug!(worker_id, "completion queue closed, exiting");
                            break;
                        }
                    }
                    recv(ctx.stop.receiver()) -> _ => {
                        debug!(worker_id, index, "stop observed while reporting, exiting");
                        break;
                    }
                }
            }

            debug!(worker_id, "worker thread exiting");
        })
        .map_err(|source| DispatchError::Spawn { name, source })
}

/// Generate one item, post-process it, and apply the failure policy.
async fn process_item<P, G, R>(
    ctx: &WorkerContext<P, G, R>,
    worker_id: usize,
    index: usize,
) -> ItemOutcome
where
    P: Send + Sync + 'static,
    G: ItemGenerator<P>,
    R: PostProcessor,
{
    let target = ctx.targets.assign(index);
    let item = ctx.generator.generate(ctx.params.as_ref(), target, index).await;
    debug!(worker_id, index, target_name = %item.target, name = %item.name, "item generated");

    let mut attempt = 1u32;
    loop {
        let err = match ctx.post.post_process(&item).await {
            Ok(()) => {
                debug!(worker_id, index, attempt, "item post-processed");
                return ItemOutcome::Completed { index };
            }
            Err(err) => err,
        };

        let failure = ItemFailure::new(index, &item, attempt, &err);
        match ctx.policy.on_failure(&failure) {
            FailureAction::Retry(delay) => {
                if ctx.stop.is_stopped() {
                    // Run is over; nobody is waiting for this outcome.
                    return ItemOutcome::Skipped(failure);
                }
                warn!(
                    worker_id,
                    index,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    reason = %failure.reason,
                    "post step failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            FailureAction::Skip => {
                warn!(worker_id, index, attempt, reason = %failure.reason, "post step failed, skipping item");
                return ItemOutcome::Skipped(failure);
            }
            FailureAction::Abort => {
                error!(worker_id, index, attempt, reason = %failure.reason, "post step failed, aborting run");
                return ItemOutcome::Aborted(failure);
            }
        }
    }
}

/// Join workers as they report exit, up to `grace`. Returns how many were
/// still running when the grace period ran out; those are detached.
pub(crate) fn join_workers(
    workers: Vec<JoinHandle<()>>,
    exited_rx: &Receiver<usize>,
    grace: Duration,
) -> usize {
    let deadline = Instant::now() + grace;
    let mut workers: Vec<Option<JoinHandle<()>>> = workers.into_iter().map(Some).collect();
    let mut remaining = workers.len();

    while remaining > 0 {
        let Ok(worker_id) = exited_rx.recv_deadline(deadline) else {
            break;
        };
        if let Some(handle) = workers.get_mut(worker_id).and_then(Option::take) {
            if handle.join().is_err() {
                warn!(worker_id, "worker panicked");
            } else {
                debug!(worker_id, "worker joined");
            }
            remaining -= 1;
        }
    }

    if remaining > 0 {
        warn!(detached = remaining, "workers did not exit within grace period - detaching");
    }
    remaining
}
