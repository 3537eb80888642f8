//! Command parsing for review commands.
//!
//! This module provides types and parsing for commands that reviewers issue via
//! pull request comments and review bodies to record approvals.
//!
//! # Supported Commands
//!
//! - `@{bot_name} approve <aspect> [<aspect>...]` - Approves one or more aspects
//! - `@{bot_name} approve all` - Approves every aspect
//! - `@{bot_name} approve-until <aspect>` - Approves every aspect up to and including `<aspect>`
//! - `@{bot_name} disapprove <aspect> [<aspect>...]` / `disapprove all` - Removes approvals
//! - `@{bot_name} attention @user1 [@user2 ...]` - Requests somebody's attention
//!
//! Aspects are `description`, `consensus`, `architecture` and `quality`.
//!
//! # Example
//!
//! ```
//! use review_bot::commands::{parse_commands, Command};
//! use review_bot::types::ReviewAspect;
//!
//! let comment = "Checked the design.\n\n@flinkbot approve-until architecture";
//! assert_eq!(
//!     parse_commands(comment, "flinkbot"),
//!     vec![Command::ApproveUntil(ReviewAspect::Architecture)]
//! );
//! ```

mod parser;
mod types;

pub use parser::parse_commands;
pub use types::{AspectSelection, Command, IssuedCommand};
