//! Checks whose warnings fill the "Automated Checks" section of the tracking
//! comment.
//!
//! Each check inspects a snapshot of the pull request and returns at most one
//! warning. Checks are synchronous: everything they need is fetched up front
//! into a [`CheckContext`].

mod docs;
mod pom;
mod ticket;

pub use docs::DocumentationCheck;
pub use pom::PomChangesCheck;
pub use ticket::AssignedTicketCheck;

use crate::tracker::TicketIssue;
use crate::types::TicketId;

/// What the checks may look at.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    pub title: String,
    /// Paths touched by the pull request.
    pub files: Vec<String>,
    /// The ticket referenced in the title.
    pub ticket_id: Option<TicketId>,
    /// The referenced ticket, when it could be fetched.
    pub ticket: Option<TicketIssue>,
}

/// A single pull request check.
pub trait PullRequestCheck: Send + Sync {
    /// Returns a warning, or `None` when the pull request passes.
    fn run_check(&self, ctx: &CheckContext) -> Option<String>;
}

/// The checks run on every new head commit, in display order.
pub fn default_checks(tracker_url: &str) -> Vec<Box<dyn PullRequestCheck>> {
    vec![
        Box::new(PomChangesCheck),
        Box::new(DocumentationCheck),
        Box::new(AssignedTicketCheck::new(tracker_url)),
    ]
}

/// Runs every check and collects the warnings in order.
pub fn run_checks(checks: &[Box<dyn PullRequestCheck>], ctx: &CheckContext) -> Vec<String> {
    checks.iter().filter_map(|check| check.run_check(ctx)).collect()
}
