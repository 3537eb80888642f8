//! Core domain types for the review bot.
//!
//! Identifiers, the ordered set of review aspects, and the approval state
//! that is folded out of a pull request's comments.

pub mod approval;
pub mod aspect;
pub mod ids;

pub use approval::ApprovalState;
pub use aspect::ReviewAspect;
pub use ids::{CommentId, InvalidRepoId, InvalidSha, Login, PrNumber, RepoId, Sha, ThreadId, TicketId};
