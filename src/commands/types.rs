//! Command types for `@{bot_name}` review commands.
//!
//! These commands are parsed from pull request comments and review bodies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Login, ReviewAspect};

/// The aspects named by an `approve` or `disapprove` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectSelection {
    /// `all`: every aspect.
    All,
    /// One or more explicitly named aspects.
    Named(BTreeSet<ReviewAspect>),
}

impl AspectSelection {
    /// Expands the selection to concrete aspects in canonical order.
    pub fn aspects(&self) -> Vec<ReviewAspect> {
        match self {
            AspectSelection::All => ReviewAspect::ALL.to_vec(),
            AspectSelection::Named(aspects) => aspects.iter().copied().collect(),
        }
    }
}

/// A parsed review command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `@bot approve <aspect> [<aspect>...]` or `@bot approve all`
    Approve(AspectSelection),

    /// `@bot disapprove <aspect> [<aspect>...]` or `@bot disapprove all`
    ///
    /// Removes approvals the issuer gave earlier.
    Disapprove(AspectSelection),

    /// `@bot approve-until <aspect>`
    ///
    /// Approves every aspect from the first through the named one.
    ApproveUntil(ReviewAspect),

    /// `@bot attention @user1 [@user2 ...]`
    Attention(BTreeSet<Login>),
}

/// A command together with the login of whoever wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCommand {
    pub issuer: Login,
    pub command: Command,
}
