//! Configuration models for dispatch runs and target selection.

pub mod dispatch;
pub mod targets;

pub use dispatch::{
    DispatchSettings, DEFAULT_CONCURRENCY, DEFAULT_QUEUE_DEPTH_MULTIPLIER,
    DEFAULT_SHUTDOWN_GRACE_MS,
};
pub use targets::{parse_range, TargetSet, TargetSpec, DEFAULT_TARGET};
