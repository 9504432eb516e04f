//! Callback contracts invoked by dispatch workers.
//!
//! A dispatch run calls two collaborators for every admitted index:
//!
//! - [`ItemGenerator`] creates one externally visible artifact for a target and
//!   reports where it landed.
//! - [`PostProcessor`] performs whatever follow-up the artifact needs (waiting
//!   for readiness, or nothing at all). Its error feeds the run's
//!   [`FailurePolicy`](crate::core::FailurePolicy).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Identifies the artifact produced by [`ItemGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratedItem {
    /// Target the artifact was created in.
    pub target: String,
    /// Name of the artifact.
    pub name: String,
}

impl GeneratedItem {
    /// Build an item from a target and name.
    pub fn new(target: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: name.into(),
        }
    }
}

/// Creates one artifact per admitted index.
///
/// `generate` has no error channel: failures are expected to be logged (and
/// retried, if desired) inside the implementation. The returned identifiers
/// are handed to the [`PostProcessor`] unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use batch_dispatcher::core::{GeneratedItem, ItemGenerator};
///
/// #[derive(Clone)]
/// struct ServiceGenerator;
///
/// struct Params {
///     prefix: String,
/// }
///
/// #[async_trait]
/// impl ItemGenerator<Params> for ServiceGenerator {
///     async fn generate(&self, params: &Params, target: &str, index: usize) -> GeneratedItem {
///         let name = format!("{}-{index}", params.prefix);
///         // create the resource...
///         GeneratedItem::new(target, name)
///     }
/// }
/// ```
#[async_trait]
pub trait ItemGenerator<P>: Send + Sync + Clone + 'static
where
    P: Send + Sync + 'static,
{
    /// Create the artifact for `index` in `target`.
    ///
    /// # Threading
    ///
    /// Called from dedicated worker threads, each driving its own
    /// single-threaded tokio runtime. Calls for different indices run
    /// concurrently.
    async fn generate(&self, params: &P, target: &str, index: usize) -> GeneratedItem;
}

/// Follow-up step run after each successful generation.
#[async_trait]
pub trait PostProcessor: Send + Sync + Clone + 'static {
    /// Process a generated item. An error is reported to the failure policy.
    async fn post_process(&self, item: &GeneratedItem) -> anyhow::Result<()>;
}

/// Post processor that accepts every item immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPostProcessor;

#[async_trait]
impl PostProcessor for NoopPostProcessor {
    async fn post_process(&self, _item: &GeneratedItem) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Probe used by [`WaitForReady`] to ask whether an artifact is usable yet.
#[async_trait]
pub trait ReadinessCheck: Send + Sync + Clone + 'static {
    /// Returns `Ok(true)` once the item is ready.
    async fn is_ready(&self, item: &GeneratedItem) -> anyhow::Result<bool>;
}

/// Default time [`WaitForReady`] waits for an item.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(600);

/// Default delay between readiness probes.
pub const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Post processor that polls a [`ReadinessCheck`] until it passes or times out.
///
/// Probe errors are treated as "not ready yet" so a transient lookup failure
/// does not fail the item before the timeout.
#[derive(Debug, Clone)]
pub struct WaitForReady<C> {
    check: C,
    timeout: Duration,
    poll_interval: Duration,
}

impl<C: ReadinessCheck> WaitForReady<C> {
    /// Wrap a readiness probe with the default timeout and poll interval.
    pub fn new(check: C) -> Self {
        Self {
            check,
            timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: DEFAULT_READY_POLL_INTERVAL,
        }
    }

    /// Set how long to wait before failing the item.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the delay between probes.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl<C: ReadinessCheck> PostProcessor for WaitForReady<C> {
    async fn post_process(&self, item: &GeneratedItem) -> anyhow::Result<()> {
        // A timeout too large to represent means wait forever.
        let deadline = Instant::now().checked_add(self.timeout);
        loop {
            match self.check.is_ready(item).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    debug!(target_name = %item.target, name = %item.name, error = %e, "readiness probe failed");
                }
            }
            let delay = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            tokio::time::sleep(delay).await;
        }
        anyhow::bail!(
            "{} in {} is not ready after {:?}",
            item.name,
            item.target,
            self.timeout
        )
    }
}
