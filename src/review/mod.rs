//! The comment-driven review engine.
//!
//! Data flows leaves first:
//!
//! 1. [`events`] merges comments and reviews into one ordered sequence.
//! 2. [`accumulate`] folds the commands found in it into an approval state.
//! 3. [`roles`] restricts consensus approvals to committers and PMC members.
//! 4. [`render`] produces the tracking comment body from [`template`].
//! 5. [`labels`] keeps the single `review=` label in line.
//! 6. [`reviewers`] turns attention requests into review requests.
//!
//! [`engine`] runs these steps for a pull request against GitHub.

pub mod accumulate;
pub mod engine;
pub mod events;
pub mod labels;
pub mod render;
pub mod reviewers;
pub mod roles;
pub mod template;

pub use engine::{
    EngineError, PassSummary, ReviewEngine, ReviewSettings, TrackingUpdate, UpdateOutcome,
};
pub use roles::{Role, Roles};
pub use template::TrackingTemplate;
