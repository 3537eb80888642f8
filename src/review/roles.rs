//! Community roles of reviewers.
//!
//! Consensus can only be approved by committers and PMC members; everybody
//! else's consensus approval is dropped before rendering and labeling.
//! Logins are compared case-insensitively, as GitHub does.

use std::collections::BTreeSet;
use std::fmt;

use crate::types::{ApprovalState, Login, ReviewAspect};

/// A recognized community role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Pmc,
    Committer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Pmc => f.write_str("[PMC]"),
            Role::Committer => f.write_str("[committer]"),
        }
    }
}

/// The committer and PMC rosters.
#[derive(Debug, Clone, Default)]
pub struct Roles {
    committers: BTreeSet<String>,
    pmc: BTreeSet<String>,
}

impl Roles {
    pub fn new<'a>(
        committers: impl IntoIterator<Item = &'a Login>,
        pmc: impl IntoIterator<Item = &'a Login>,
    ) -> Self {
        Roles {
            committers: committers.into_iter().map(Login::folded).collect(),
            pmc: pmc.into_iter().map(Login::folded).collect(),
        }
    }

    /// The role of a login. PMC membership wins over committership.
    pub fn role_of(&self, login: &Login) -> Option<Role> {
        let folded = login.folded();
        if self.pmc.contains(&folded) {
            Some(Role::Pmc)
        } else if self.committers.contains(&folded) {
            Some(Role::Committer)
        } else {
            None
        }
    }

    /// Renders a login with its role suffix, e.g. `@rmetzger [PMC]`.
    pub fn annotate(&self, login: &Login) -> String {
        match self.role_of(login) {
            Some(role) => format!("{login} {role}"),
            None => login.to_string(),
        }
    }

    /// Drops consensus approvals from logins without a role.
    pub fn filter(&self, state: &mut ApprovalState) {
        state.retain_approvers(ReviewAspect::Consensus, |login| {
            self.role_of(login).is_some()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(name: &str) -> Login {
        Login::new(name)
    }

    fn roles() -> Roles {
        let committers = [login("alice"), login("both")];
        let pmc = [login("Carol"), login("both")];
        Roles::new(&committers, &pmc)
    }

    #[test]
    fn pmc_takes_precedence_over_committer() {
        assert_eq!(roles().role_of(&login("both")), Some(Role::Pmc));
    }

    #[test]
    fn roles_are_case_insensitive() {
        let roles = roles();
        assert_eq!(roles.role_of(&login("carol")), Some(Role::Pmc));
        assert_eq!(roles.role_of(&login("ALICE")), Some(Role::Committer));
        assert_eq!(roles.role_of(&login("dave")), None);
    }

    #[test]
    fn annotation_appends_role() {
        let roles = roles();
        assert_eq!(roles.annotate(&login("carol")), "@carol [PMC]");
        assert_eq!(roles.annotate(&login("alice")), "@alice [committer]");
        assert_eq!(roles.annotate(&login("dave")), "@dave");
    }

    #[test]
    fn filter_only_restricts_consensus() {
        let mut state = ApprovalState::new();
        for aspect in ReviewAspect::ALL {
            state.approve(aspect, &login("dave"));
        }
        state.approve(ReviewAspect::Consensus, &login("alice"));

        roles().filter(&mut state);

        let consensus: Vec<_> = state.approvers(ReviewAspect::Consensus).collect();
        assert_eq!(consensus, vec![&login("alice")]);
        for aspect in [
            ReviewAspect::Description,
            ReviewAspect::Architecture,
            ReviewAspect::Quality,
        ] {
            assert!(state.approvers(aspect).any(|l| l == &login("dave")));
        }
    }

    #[test]
    fn filter_can_empty_consensus() {
        let mut state = ApprovalState::new();
        state.approve(ReviewAspect::Consensus, &login("dave"));

        roles().filter(&mut state);

        assert!(!state.has_approval(ReviewAspect::Consensus));
    }
}
