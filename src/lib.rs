//! Review Bot - tracks the review progress of pull requests on GitHub.
//!
//! The bot keeps one tracking comment per pull request up to date with the
//! approvals given through `@bot` commands, mirrors the progress onto a review
//! label, and labels pull requests with the components of their Jira ticket.

pub mod cache;
pub mod checks;
pub mod commands;
pub mod config;
pub mod effects;
pub mod github;
pub mod labeler;
pub mod persistence;
pub mod review;
pub mod tracker;
pub mod types;
pub mod worker;

#[cfg(test)]
mod test_utils;
