//! Approval state derived from a pull request's comment history.
//!
//! An `ApprovalState` is never persisted. It is rebuilt on every pass by
//! replaying the full, ordered event list of the pull request, so the
//! comment thread stays the single source of truth.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::aspect::ReviewAspect;
use super::ids::Login;

/// Per-aspect approver sets plus the cumulative attention set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalState {
    approvals: BTreeMap<ReviewAspect, BTreeSet<Login>>,

    /// Attention targets, each mapped to the logins that asked for them.
    attention: BTreeMap<Login, BTreeSet<Login>>,
}

impl ApprovalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `approver` to the aspect's approver set. Re-approving is a no-op.
    pub fn approve(&mut self, aspect: ReviewAspect, approver: &Login) {
        self.approvals
            .entry(aspect)
            .or_default()
            .insert(approver.clone());
    }

    /// Removes `approver` from the aspect's approver set. Removing an absent
    /// approval is a no-op.
    pub fn disapprove(&mut self, aspect: ReviewAspect, approver: &Login) {
        if let Some(approvers) = self.approvals.get_mut(&aspect) {
            approvers.remove(approver);
            if approvers.is_empty() {
                self.approvals.remove(&aspect);
            }
        }
    }

    /// Records that `requested_by` asked for `target`'s attention.
    pub fn request_attention(&mut self, target: &Login, requested_by: &Login) {
        self.attention
            .entry(target.clone())
            .or_default()
            .insert(requested_by.clone());
    }

    /// Approvers of an aspect, sorted.
    pub fn approvers(&self, aspect: ReviewAspect) -> impl Iterator<Item = &Login> {
        self.approvals.get(&aspect).into_iter().flatten()
    }

    pub fn has_approval(&self, aspect: ReviewAspect) -> bool {
        self.approvals.get(&aspect).is_some_and(|set| !set.is_empty())
    }

    /// Logins whose attention was requested, sorted.
    pub fn attention(&self) -> impl Iterator<Item = &Login> {
        self.attention.keys()
    }

    pub fn has_attention(&self) -> bool {
        !self.attention.is_empty()
    }

    /// Whether every request for `target`'s attention came from `target` itself.
    pub fn is_self_requested(&self, target: &Login) -> bool {
        self.attention
            .get(target)
            .is_some_and(|by| by.iter().all(|login| login.folded() == target.folded()))
    }

    /// Keeps only the approvers of `aspect` for which `keep` returns true.
    pub fn retain_approvers(&mut self, aspect: ReviewAspect, mut keep: impl FnMut(&Login) -> bool) {
        if let Some(approvers) = self.approvals.get_mut(&aspect) {
            approvers.retain(|login| keep(login));
            if approvers.is_empty() {
                self.approvals.remove(&aspect);
            }
        }
    }
}
