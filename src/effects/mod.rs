//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! The review engine, the component labeler and the notification loop only ever
//! build `GitHubEffect` values; which interpreter runs them is decided by whoever
//! constructs those components.

pub mod executor;
pub mod github;
pub mod interpreter;

pub use executor::{EffectError, EffectExecutor};
pub use github::{
    CommentData, GitHubEffect, GitHubResponse, LabelData, NotificationData, PrData, PrListState,
    PrSummary, ReviewData,
};
pub use interpreter::GitHubInterpreter;
