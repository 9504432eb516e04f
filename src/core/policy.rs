//! Failure strategies for post-processing errors.
//!
//! When a [`PostProcessor`](crate::core::PostProcessor) fails, the worker asks
//! the run's [`FailurePolicy`] what the failure means:
//!
//! | policy | behaviour |
//! |---|---|
//! | [`AbortOnFailure`] (default) | stop the run, return [`DispatchError::ItemFailed`](crate::core::DispatchError::ItemFailed) |
//! | [`SkipFailures`] | count the item as settled, record it in the report, continue |
//! | [`RetryWithBackoff`] | re-run the post step after a delay, then fall back to another action |
//!
//! Any `Fn(&ItemFailure) -> FailureAction` closure is also a policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::outcome::ItemFailure;

/// What to do with a failed post step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureAction {
    /// End the run; no further items are admitted.
    Abort,
    /// Treat the item as settled and keep going.
    Skip,
    /// Run the post step again after the given delay.
    Retry(Duration),
}

/// Decides how a run reacts to a failed post step.
pub trait FailurePolicy: Send + Sync + 'static {
    /// Inspect a failure and choose the next action.
    fn on_failure(&self, failure: &ItemFailure) -> FailureAction;
}

impl<F> FailurePolicy for F
where
    F: Fn(&ItemFailure) -> FailureAction + Send + Sync + 'static,
{
    fn on_failure(&self, failure: &ItemFailure) -> FailureAction {
        self(failure)
    }
}

/// Fail fast: the first failed item ends the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFailure;

impl FailurePolicy for AbortOnFailure {
    fn on_failure(&self, _failure: &ItemFailure) -> FailureAction {
        FailureAction::Abort
    }
}

/// Record failed items and keep dispatching.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipFailures;

impl FailurePolicy for SkipFailures {
    fn on_failure(&self, _failure: &ItemFailure) -> FailureAction {
        FailureAction::Skip
    }
}

/// Retry the post step with exponential backoff.
///
/// Attempt `n` (1-based) that fails waits `initial_backoff * 2^(n-1)`, capped
/// at `max_backoff`. Once `max_attempts` attempts have failed, `exhausted` is
/// returned instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryWithBackoff {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Action once attempts are used up.
    pub exhausted: FailureAction,
}

impl RetryWithBackoff {
    /// Retry up to `max_attempts` times, then abort.
    pub const fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(30),
            exhausted: FailureAction::Abort,
        }
    }

    /// Cap individual delays.
    #[must_use]
    pub const fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Choose the action taken once retries are exhausted.
    #[must_use]
    pub const fn then(mut self, exhausted: FailureAction) -> Self {
        self.exhausted = exhausted;
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

impl FailurePolicy for RetryWithBackoff {
    fn on_failure(&self, failure: &ItemFailure) -> FailureAction {
        if failure.attempt < self.max_attempts {
            FailureAction::Retry(self.backoff_for(failure.attempt))
        } else {
            self.exhausted
        }
    }
}
