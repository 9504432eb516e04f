//! Core dispatch abstractions: queues, workers, admission, and completion.

pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod outcome;
pub mod policy;
pub(crate) mod scheduler;
pub mod stats;
pub mod stop;
pub(crate) mod tracker;
pub(crate) mod worker_pool;

pub use dispatcher::{BatchDispatcher, DispatchReport};
pub use error::{AppResult, ConfigError, DispatchError};
pub use generator::{
    GeneratedItem, ItemGenerator, NoopPostProcessor, PostProcessor, ReadinessCheck, WaitForReady,
    DEFAULT_READY_POLL_INTERVAL, DEFAULT_READY_TIMEOUT,
};
pub use outcome::ItemFailure;
pub use policy::{AbortOnFailure, FailureAction, FailurePolicy, RetryWithBackoff, SkipFailures};
pub use stats::DispatchStats;
pub use stop::{stop_signal, StopSignal, StopTrigger};
