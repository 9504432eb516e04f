//! Target selection and round-robin assignment.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// Target used when none is configured.
pub const DEFAULT_TARGET: &str = "default";

/// How the target list for a run is described.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TargetSpec {
    /// The single target `default`.
    #[default]
    Default,
    /// One named target.
    Single {
        /// Target name.
        name: String,
    },
    /// An explicit ordered list.
    List {
        /// Target names, in assignment order.
        names: Vec<String>,
    },
    /// `{prefix}-{i}` for every `i` in `start..=end`.
    PrefixRange {
        /// Name prefix.
        prefix: String,
        /// First suffix (must be > 0).
        start: u32,
        /// Last suffix, inclusive (must be >= start).
        end: u32,
    },
}

impl TargetSpec {
    /// Build a prefix range from the `start,end` textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRange`] if `range` is malformed.
    pub fn prefix_range(prefix: impl Into<String>, range: &str) -> Result<Self, ConfigError> {
        let (start, end) = parse_range(range)?;
        Ok(Self::PrefixRange {
            prefix: prefix.into(),
            start,
            end,
        })
    }

    /// Expand into the ordered, non-empty target list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyTargets`] for an empty list,
    /// [`ConfigError::EmptyTargetName`] for an empty name, and
    /// [`ConfigError::InvalidRange`] for an out-of-bounds prefix range.
    pub fn resolve(&self) -> Result<TargetSet, ConfigError> {
        let names = match self {
            Self::Default => vec![DEFAULT_TARGET.to_string()],
            Self::Single { name } => vec![name.clone()],
            Self::List { names } => names.clone(),
            Self::PrefixRange { prefix, start, end } => {
                check_range(*start, *end)?;
                (*start..=*end).map(|i| format!("{prefix}-{i}")).collect()
            }
        };
        TargetSet::new(names)
    }
}

/// Parse `"start,end"` into a validated inclusive range.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRange`] unless the input is two positive
/// integers separated by a comma with `start <= end`.
pub fn parse_range(range: &str) -> Result<(u32, u32), ConfigError> {
    let parts: Vec<&str> = range.split(',').collect();
    let [start, end] = parts.as_slice() else {
        return Err(ConfigError::InvalidRange(format!(
            "expected range like 1,500, given {range}"
        )));
    };
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidRange(format!("{s:?}: {e}")))
    };
    let (start, end) = (parse(*start)?, parse(*end)?);
    check_range(start, end)?;
    Ok((start, end))
}

fn check_range(start: u32, end: u32) -> Result<(), ConfigError> {
    if start == 0 || end == 0 || start > end {
        return Err(ConfigError::InvalidRange(format!(
            "start and end must be positive with start <= end, got {start},{end}"
        )));
    }
    Ok(())
}

/// Resolved, non-empty target list shared by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet {
    names: Arc<[String]>,
}

impl TargetSet {
    /// Build a target set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyTargets`] if `names` is empty and
    /// [`ConfigError::EmptyTargetName`] if it contains an empty name.
    pub fn new(names: Vec<String>) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Err(ConfigError::EmptyTargets);
        }
        if let Some(position) = names.iter().position(String::is_empty) {
            return Err(ConfigError::EmptyTargetName { position });
        }
        Ok(Self {
            names: names.into(),
        })
    }

    /// Target for `index`: `names[index % len]`.
    #[must_use]
    pub fn assign(&self, index: usize) -> &str {
        &self.names[index % self.names.len()]
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty. A constructed set never is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Targets in assignment order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
