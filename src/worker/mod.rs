//! Background loops.
//!
//! Four independent periodic tasks run concurrently, each on its own period:
//!
//! - [`NewPullRequestScan`]: tracking comments for new pull requests
//! - [`MentionScan`]: updates triggered by @-mentions
//! - [`ComponentLabeling`]: ticket components as labels
//! - [`CacheInvalidation`]: the component cache sweep
//!
//! All of them stop on the shared shutdown token.
//!
//! # Module Structure
//!
//! - [`poll`]: periods, read from the environment
//! - [`scheduler`]: the [`PeriodicTask`] trait and its driver
//! - [`tasks`]: the tasks themselves

mod poll;
mod scheduler;
mod tasks;

pub use poll::PollConfig;
pub use scheduler::{PeriodicTask, run_periodic};
pub use tasks::{CacheInvalidation, ComponentLabeling, MentionScan, NewPullRequestScan};
