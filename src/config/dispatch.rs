//! Dispatch run configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::targets::TargetSpec;
use crate::core::ConfigError;

/// Default worker count.
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Default queue depth, as a multiple of `batch_size`.
pub const DEFAULT_QUEUE_DEPTH_MULTIPLIER: usize = 5;
/// Default wait for workers after the run stops.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

/// Settings for one dispatch run.
///
/// ```rust,ignore
/// use batch_dispatcher::config::{DispatchSettings, TargetSpec};
///
/// let settings = DispatchSettings::new()
///     .with_total_count(500)
///     .with_interval_ms(20_000)
///     .with_batch_size(20)
///     .with_targets(TargetSpec::prefix_range("testns", "1,10")?);
/// settings.validate()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Milliseconds between admission ticks.
    pub interval_ms: u64,
    /// Items to admit and settle.
    pub total_count: usize,
    /// Maximum indices admitted per tick.
    pub batch_size: usize,
    /// Worker threads.
    pub concurrency: usize,
    /// Work and completion queues hold `batch_size * queue_depth_multiplier` entries.
    pub queue_depth_multiplier: usize,
    /// How long to wait for workers after stop before detaching them.
    pub shutdown_grace_ms: u64,
    /// Targets assigned round-robin by index.
    pub targets: TargetSpec,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            total_count: 0,
            batch_size: 1,
            concurrency: DEFAULT_CONCURRENCY,
            queue_depth_multiplier: DEFAULT_QUEUE_DEPTH_MULTIPLIER,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            targets: TargetSpec::Default,
        }
    }
}

impl DispatchSettings {
    /// Settings with defaults: one item per second, ten workers, no items.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the admission interval in milliseconds.
    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the admission interval, rounded up to whole milliseconds.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_nanos().div_ceil(1_000_000);
        self.interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Set the number of items.
    #[must_use]
    pub fn with_total_count(mut self, total_count: usize) -> Self {
        self.total_count = total_count;
        self
    }

    /// Set the per-tick admission limit.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the queue depth multiplier.
    #[must_use]
    pub fn with_queue_depth_multiplier(mut self, multiplier: usize) -> Self {
        self.queue_depth_multiplier = multiplier;
        self
    }

    /// Set the shutdown grace period in milliseconds.
    #[must_use]
    pub fn with_shutdown_grace_ms(mut self, grace_ms: u64) -> Self {
        self.shutdown_grace_ms = grace_ms;
        self
    }

    /// Set the targets.
    #[must_use]
    pub fn with_targets(mut self, targets: TargetSpec) -> Self {
        self.targets = targets;
        self
    }

    /// Admission interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Shutdown grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Capacity of the work and completion queues: `batch_size *
    /// queue_depth_multiplier`, capped at `total_count` since a run never
    /// holds more items than that. Always at least 1.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        let depth = self.batch_size.saturating_mul(self.queue_depth_multiplier);
        let ceiling = if self.total_count == 0 { 1 } else { self.total_count };
        if depth < ceiling {
            depth
        } else {
            ceiling
        }
    }

    /// Validate settings values. Targets are validated when resolved.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.queue_depth_multiplier == 0 {
            return Err(ConfigError::ZeroQueueMultiplier);
        }
        self.targets.resolve()?;
        Ok(())
    }

    /// Parse settings from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or any validation error.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load settings from the process environment, reading a `.env` file first
    /// if one exists.
    ///
    /// # Errors
    ///
    /// See [`DispatchSettings::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from `DISPATCH_*` keys resolved by `lookup`. Missing keys
    /// keep their defaults.
    ///
    /// | key | field |
    /// |---|---|
    /// | `DISPATCH_TOTAL` | `total_count` |
    /// | `DISPATCH_INTERVAL_MS` | `interval_ms` |
    /// | `DISPATCH_BATCH` | `batch_size` |
    /// | `DISPATCH_CONCURRENCY` | `concurrency` |
    /// | `DISPATCH_QUEUE_MULTIPLIER` | `queue_depth_multiplier` |
    /// | `DISPATCH_SHUTDOWN_GRACE_MS` | `shutdown_grace_ms` |
    /// | `DISPATCH_TARGETS` | comma-separated target list |
    /// | `DISPATCH_TARGET_PREFIX` + `DISPATCH_TARGET_RANGE` | prefix range |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] for unparsable numbers or conflicting
    /// target keys, or any validation error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parsed(&lookup, "DISPATCH_TOTAL")? {
            cfg.total_count = v;
        }
        if let Some(v) = parsed(&lookup, "DISPATCH_INTERVAL_MS")? {
            cfg.interval_ms = v;
        }
        if let Some(v) = parsed(&lookup, "DISPATCH_BATCH")? {
            cfg.batch_size = v;
        }
        if let Some(v) = parsed(&lookup, "DISPATCH_CONCURRENCY")? {
            cfg.concurrency = v;
        }
        if let Some(v) = parsed(&lookup, "DISPATCH_QUEUE_MULTIPLIER")? {
            cfg.queue_depth_multiplier = v;
        }
        if let Some(v) = parsed(&lookup, "DISPATCH_SHUTDOWN_GRACE_MS")? {
            cfg.shutdown_grace_ms = v;
        }

        let list = lookup("DISPATCH_TARGETS").filter(|s| !s.trim().is_empty());
        let prefix = lookup("DISPATCH_TARGET_PREFIX").filter(|s| !s.trim().is_empty());
        cfg.targets = match (list, prefix) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Env {
                    var: "DISPATCH_TARGETS".into(),
                    reason: "expected either a target list or a prefix with range, not both"
                        .into(),
                })
            }
            (Some(list), None) => TargetSpec::List {
                names: list.split(',').map(|s| s.trim().to_string()).collect(),
            },
            (None, Some(prefix)) => {
                let range = lookup("DISPATCH_TARGET_RANGE").ok_or_else(|| ConfigError::Env {
                    var: "DISPATCH_TARGET_RANGE".into(),
                    reason: "required when DISPATCH_TARGET_PREFIX is set".into(),
                })?;
                TargetSpec::prefix_range(prefix, &range)?
            }
            (None, None) => TargetSpec::Default,
        };

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parsed<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Env {
                var: var.to_string(),
                reason: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}
