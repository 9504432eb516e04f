//! Error types for dispatcher operations.

use thiserror::Error;

use crate::core::outcome::ItemFailure;

/// Errors produced while validating dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The resolved target list is empty.
    #[error("at least one target must be provided")]
    EmptyTargets,
    /// A target list contains an empty name.
    #[error("target name at position {position} is empty")]
    EmptyTargetName {
        /// Zero-based position of the empty name in the list.
        position: usize,
    },
    /// Admission interval is zero.
    #[error("interval must be greater than 0")]
    ZeroInterval,
    /// Batch size is zero.
    #[error("batch_size must be greater than 0")]
    ZeroBatchSize,
    /// Worker count is zero.
    #[error("concurrency must be greater than 0")]
    ZeroConcurrency,
    /// Queue depth multiplier is zero.
    #[error("queue_depth_multiplier must be greater than 0")]
    ZeroQueueMultiplier,
    /// A target range could not be parsed or is out of bounds.
    #[error("invalid target range: {0}")]
    InvalidRange(String),
    /// An environment variable held an unusable value.
    #[error("environment variable {var} is invalid: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// Serialized configuration could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Errors surfaced by a dispatch run.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Configuration was rejected before any worker started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A post-processing step failed and the failure policy aborted the run.
    #[error("item {} ({}/{}) failed: {}", .0.index, .0.target, .0.name, .0.reason)]
    ItemFailed(ItemFailure),
    /// Every worker exited before the run settled all items.
    #[error("all workers exited after settling {settled} of {total} items")]
    WorkersExited {
        /// Items completed or skipped when the last worker exited.
        settled: usize,
        /// Items the run was configured for.
        total: usize,
    },
    /// `run` was called while another run on the same dispatcher is active.
    #[error("dispatcher is already running")]
    AlreadyRunning,
    /// A dispatcher thread could not be spawned.
    #[error("failed to spawn {name}: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },
    /// Internal error (thread panic, join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
