//! # Batch Dispatcher
//!
//! A rate-limited batch work dispatcher for bulk provisioning and load-generation
//! jobs.
//!
//! The dispatcher admits `total_count` item indices onto a bounded work queue at
//! a fixed cadence (`batch_size` per `interval`), hands them to a pool of worker
//! threads, and tracks completions until every item has settled. Each worker
//! asks an [`ItemGenerator`](core::ItemGenerator) for the item, runs a
//! [`PostProcessor`](core::PostProcessor) on it (for example waiting until the
//! created resource reports ready), and reports the outcome.
//!
//! ## Key Features
//!
//! - **Rate-Limited Admission**: At most `batch_size` items per tick, in index order
//! - **Round-Robin Targets**: Item `i` goes to `targets[i % targets.len()]`
//! - **Backpressure**: Bounded queues block the scheduler when workers fall behind
//! - **One-Shot Stop**: A single broadcast stops the scheduler and every worker
//! - **Failure Policies**: Abort, skip, or retry failed items instead of exiting the process
//!
//! ## Running a Dispatch
//!
//! ```rust,ignore
//! use batch_dispatcher::config::{DispatchSettings, TargetSpec};
//! use batch_dispatcher::core::{
//!     BatchDispatcher, GeneratedItem, ItemGenerator, RetryWithBackoff, WaitForReady,
//! };
//! use std::time::Duration;
//!
//! #[derive(Clone)]
//! struct ServiceGenerator;
//!
//! #[async_trait::async_trait]
//! impl ItemGenerator<ServiceTemplate> for ServiceGenerator {
//!     async fn generate(&self, tpl: &ServiceTemplate, target: &str, index: usize) -> GeneratedItem {
//!         let name = tpl.create_in(target, index).await;
//!         GeneratedItem::new(target, name)
//!     }
//! }
//!
//! let settings = DispatchSettings::from_env()?;
//! let dispatcher = BatchDispatcher::new(
//!     settings,
//!     template,
//!     ServiceGenerator,
//!     WaitForReady::new(ReadyProbe::new(client)),
//! )?
//! .with_policy(RetryWithBackoff::new(3, Duration::from_secs(1)));
//!
//! let report = dispatcher.run()?;
//! println!("{} items ready in {:?}", report.stats.completed, report.elapsed);
//! ```
//!
//! For complete examples, see `tests/dispatcher_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core dispatch abstractions: scheduler, workers, tracker, and stop signal.
pub mod core;
/// Configuration models for runs and targets.
pub mod config;
/// Shared utilities.
pub mod util;
