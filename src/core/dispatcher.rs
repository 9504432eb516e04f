//! The dispatcher: wiring for the scheduler, worker pool, and tracker.
//!
//! ```text
//! AdmissionScheduler ──► work queue ──► workers ──► completion queue ──► CompletionTracker
//!         ▲                               ▲                                     │
//!         └────────────── stop signal ────┴─────────────────────────────────────┘
//! ```
//!
//! The scheduler runs on the calling thread; the tracker and every worker run
//! on their own named threads. Both queues hold
//! [`DispatchSettings::queue_capacity`] entries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::{DispatchSettings, TargetSet};
use crate::core::error::DispatchError;
use crate::core::generator::{ItemGenerator, PostProcessor};
use crate::core::outcome::{ItemFailure, ItemOutcome};
use crate::core::policy::{AbortOnFailure, FailurePolicy};
use crate::core::scheduler::AdmissionScheduler;
use crate::core::stats::{DispatchCounters, DispatchStats};
use crate::core::stop::stop_signal;
use crate::core::tracker::{CompletionTracker, RunEnd};
use crate::core::worker_pool::{join_workers, spawn_worker, WorkerContext};

/// Summary of a run that settled every item.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Identifier attached to the run's tracing span.
    pub run_id: Uuid,
    /// Final progress counters.
    pub stats: DispatchStats,
    /// Items skipped by the failure policy, in the order they were reported.
    pub skipped: Vec<ItemFailure>,
    /// Workers still inside a callback when the shutdown grace period ended.
    pub detached_workers: usize,
    /// Wall time from start to the end of shutdown.
    pub elapsed: Duration,
}

/// Clears the running flag when a run ends, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Rate-limited batch dispatcher.
///
/// Admits `total_count` indices, at most `batch_size` per `interval`, to
/// `concurrency` workers. Each worker generates the item for
/// `targets[index % targets.len()]`, post-processes it, and reports the
/// outcome. The run ends once every item has settled, or as soon as the
/// failure policy aborts.
///
/// # Example
///
/// ```rust,ignore
/// use batch_dispatcher::config::{DispatchSettings, TargetSpec};
/// use batch_dispatcher::core::{BatchDispatcher, NoopPostProcessor};
///
/// let settings = DispatchSettings::new()
///     .with_total_count(500)
///     .with_interval_ms(20_000)
///     .with_batch_size(20)
///     .with_targets(TargetSpec::prefix_range("testns", "1,10")?);
///
/// let dispatcher = BatchDispatcher::new(settings, params, ServiceGenerator, NoopPostProcessor)?;
/// let report = dispatcher.run()?;
/// println!("completed {} items", report.stats.completed);
/// ```
pub struct BatchDispatcher<P, G, R> {
    settings: DispatchSettings,
    targets: TargetSet,
    params: Arc<P>,
    generator: G,
    post: R,
    policy: Arc<dyn FailurePolicy>,
    counters: Arc<DispatchCounters>,
    running: AtomicBool,
}

impl<P, G, R> BatchDispatcher<P, G, R>
where
    P: Send + Sync + 'static,
    G: ItemGenerator<P>,
    R: PostProcessor,
{
    /// Validate settings and build a dispatcher. Failures abort the run on the
    /// first failed item until [`with_policy`](Self::with_policy) says otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] if the settings or targets are invalid.
    pub fn new(
        settings: DispatchSettings,
        params: P,
        generator: G,
        post: R,
    ) -> Result<Self, DispatchError> {
        settings.validate()?;
        let targets = settings.targets.resolve()?;

        Ok(Self {
            settings,
            targets,
            params: Arc::new(params),
            generator,
            post,
            policy: Arc::new(AbortOnFailure),
            counters: Arc::new(DispatchCounters::default()),
            running: AtomicBool::new(false),
        })
    }

    /// Install a failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl FailurePolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Settings this dispatcher was built with.
    #[must_use]
    pub const fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Resolved targets.
    #[must_use]
    pub const fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Progress of the current (or last) run.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Run on tokio's blocking pool, for callers inside an async runtime.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run), plus [`DispatchError::Internal`] if the
    /// blocking task panics.
    pub async fn run_async(self: Arc<Self>) -> Result<DispatchReport, DispatchError> {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .map_err(|e| DispatchError::Internal(format!("dispatch task failed: {e}")))?
    }

    /// Dispatch every item and block until the run ends.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::ItemFailed`] if the failure policy aborted the run
    /// - [`DispatchError::WorkersExited`] if all workers died before settling
    /// - [`DispatchError::AlreadyRunning`] if another run is in progress
    /// - [`DispatchError::Spawn`] if a thread could not be started
    pub fn run(&self) -> Result<DispatchReport, DispatchError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(DispatchError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);
        self.run_once()
    }

    fn run_once(&self) -> Result<DispatchReport, DispatchError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("dispatch", %run_id);
        let _entered = span.enter();
        let started = Instant::now();

        let total = self.settings.total_count;
        let concurrency = self.settings.concurrency;
        let capacity = self.settings.queue_capacity();
        self.counters.reset(total);

        info!(
            total,
            batch_size = self.settings.batch_size,
            concurrency,
            interval_ms = self.settings.interval_ms,
            targets = self.targets.len(),
            "dispatch started"
        );

        let (work_tx, work_rx) = bounded::<usize>(capacity);
        let (completion_tx, completion_rx) = bounded::<ItemOutcome>(capacity);
        let (exited_tx, exited_rx) = bounded::<usize>(concurrency);
        // An early return below drops the trigger, which stops spawned workers.
        let (trigger, stop) = stop_signal();

        let mut workers = Vec::with_capacity(concurrency);
        for worker_id in 0..concurrency {
            let ctx = WorkerContext {
                targets: self.targets.clone(),
                params: Arc::clone(&self.params),
                generator: self.generator.clone(),
                post: self.post.clone(),
                policy: Arc::clone(&self.policy),
                work_rx: work_rx.clone(),
                completion_tx: completion_tx.clone(),
                stop: stop.clone(),
                exited_tx: exited_tx.clone(),
                span: span.clone(),
            };
            workers.push(spawn_worker(worker_id, ctx)?);
        }
        drop(work_rx);
        drop(completion_tx);
        drop(exited_tx);

        let tracker = CompletionTracker::new(total, completion_rx, trigger, Arc::clone(&self.counters));
        let tracker_span = span.clone();
        let tracker_handle = thread::Builder::new()
            .name("dispatch-tracker".into())
            .spawn(move || {
                let _entered = tracker_span.enter();
                tracker.run()
            })
            .map_err(|source| DispatchError::Spawn {
                name: "dispatch-tracker".into(),
                source,
            })?;

        let admitted = AdmissionScheduler::new(
            self.settings.interval(),
            total,
            self.settings.batch_size,
            work_tx,
            stop,
            Arc::clone(&self.counters),
        )
        .run();

        let tracker_report = tracker_handle
            .join()
            .map_err(|_| DispatchError::Internal("completion tracker panicked".into()))?;

        let detached_workers = join_workers(workers, &exited_rx, self.settings.shutdown_grace());
        let stats = self.counters.snapshot();
        let elapsed = started.elapsed();

        match tracker_report.end {
            RunEnd::Settled => {
                info!(
                    admitted,
                    completed = tracker_report.completed,
                    skipped = tracker_report.skipped.len(),
                    ticks = stats.admission_ticks,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "dispatch finished"
                );
                Ok(DispatchReport {
                    run_id,
                    stats,
                    skipped: tracker_report.skipped,
                    detached_workers,
                    elapsed,
                })
            }
            RunEnd::Aborted(failure) => {
                error!(
                    admitted,
                    completed = tracker_report.completed,
                    index = failure.index,
                    "dispatch aborted"
                );
                Err(DispatchError::ItemFailed(failure))
            }
            RunEnd::WorkersExited => {
                warn!(admitted, settled = stats.settled(), total, "all workers exited early");
                Err(DispatchError::WorkersExited {
                    settled: stats.settled(),
                    total,
                })
            }
        }
    }
}
