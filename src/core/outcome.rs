//! Typed messages carried on the completion queue.

use serde::{Deserialize, Serialize};

use crate::core::generator::GeneratedItem;

/// Describes a failed post-processing step for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Zero-based item index.
    pub index: usize,
    /// Target reported by the generator.
    pub target: String,
    /// Artifact name reported by the generator.
    pub name: String,
    /// 1-based attempt number of the post step that failed.
    pub attempt: u32,
    /// Rendered error from the post step.
    pub reason: String,
}

impl ItemFailure {
    pub(crate) fn new(index: usize, item: &GeneratedItem, attempt: u32, err: &anyhow::Error) -> Self {
        Self {
            index,
            target: item.target.clone(),
            name: item.name.clone(),
            attempt,
            reason: format!("{err:#}"),
        }
    }
}

/// Outcome of one work item as reported by a worker.
#[derive(Debug, Clone)]
pub(crate) enum ItemOutcome {
    /// Generated and post-processed successfully.
    Completed { index: usize },
    /// Post step failed; the policy chose to continue without it.
    Skipped(ItemFailure),
    /// Post step failed; the policy chose to end the run.
    Aborted(ItemFailure),
}
