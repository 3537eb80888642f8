//! Turning attention requests into review requests.
//!
//! Users whose attention was requested are asked for a review, provided they
//! are collaborators of the repository (GitHub rejects anyone else). Existing
//! review requests are never withdrawn.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::effects::{EffectError, EffectExecutor, GitHubInterpreter};
use crate::types::{ApprovalState, Login, PrNumber, RepoId};

/// Collaborator lists, memoized per repository for the lifetime of the
/// process.
#[derive(Debug, Default)]
pub struct CollaboratorCache {
    by_repo: Mutex<HashMap<RepoId, BTreeSet<String>>>,
}

impl CollaboratorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-folded collaborator logins of `repo`, fetched on first use.
    ///
    /// The lock is held across the fetch so concurrent callers do not list
    /// the same repository twice.
    pub async fn collaborators<G: GitHubInterpreter>(
        &self,
        github: &EffectExecutor<G>,
        repo: &RepoId,
    ) -> Result<BTreeSet<String>, EffectError> {
        let mut by_repo = self.by_repo.lock().await;
        if let Some(cached) = by_repo.get(repo) {
            return Ok(cached.clone());
        }
        let fetched: BTreeSet<String> = github
            .list_collaborators()
            .await?
            .iter()
            .map(Login::folded)
            .collect();
        debug!(%repo, count = fetched.len(), "cached repository collaborators");
        by_repo.insert(repo.clone(), fetched.clone());
        Ok(fetched)
    }
}

/// The outcome of matching attention targets against existing requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerPlan {
    /// Targets that are not requested yet and may be requested.
    pub added: BTreeSet<Login>,
    /// Targets dropped because they are not collaborators.
    pub skipped: BTreeSet<Login>,
}

/// Decides which attention targets to add as reviewers.
///
/// Targets already requested are ignored, as are targets who only asked for
/// their own attention.
pub fn plan_reviewers(
    state: &ApprovalState,
    requested: &BTreeSet<Login>,
    collaborators: &BTreeSet<String>,
) -> ReviewerPlan {
    let requested: BTreeSet<String> = requested.iter().map(Login::folded).collect();
    let mut plan = ReviewerPlan::default();

    for target in state.attention() {
        if requested.contains(&target.folded()) || state.is_self_requested(target) {
            continue;
        }
        if collaborators.contains(&target.folded()) {
            plan.added.insert(target.clone());
        } else {
            plan.skipped.insert(target.clone());
        }
    }

    plan
}

/// Requests reviews from the attention targets of `state`.
///
/// Issues at most one request, and only when there is somebody new to add.
pub async fn assign_reviewers<G: GitHubInterpreter>(
    github: &EffectExecutor<G>,
    collaborators: &CollaboratorCache,
    repo: &RepoId,
    pr: PrNumber,
    requested: &BTreeSet<Login>,
    state: &ApprovalState,
) -> Result<ReviewerPlan, EffectError> {
    if !state.has_attention() {
        return Ok(ReviewerPlan::default());
    }

    let known = collaborators.collaborators(github, repo).await?;
    let plan = plan_reviewers(state, requested, &known);

    for login in &plan.skipped {
        warn!(%pr, %login, "not requesting review: user is not a collaborator of the repository");
    }
    if plan.added.is_empty() {
        return Ok(plan);
    }

    info!(%pr, reviewers = ?plan.added, "requesting reviews");
    let reviewers: BTreeSet<Login> = requested.union(&plan.added).cloned().collect();
    github.request_reviewers(pr, reviewers).await?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::GitHubEffect;
    use crate::test_utils::FakeGitHub;

    fn login(name: &str) -> Login {
        Login::new(name)
    }

    fn folded(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_ascii_lowercase()).collect()
    }

    fn attention(pairs: &[(&str, &str)]) -> ApprovalState {
        let mut state = ApprovalState::new();
        for (target, by) in pairs {
            state.request_attention(&login(target), &login(by));
        }
        state
    }

    #[test]
    fn new_collaborators_are_added() {
        let state = attention(&[("bob", "alice"), ("carol", "alice")]);
        let plan = plan_reviewers(&state, &BTreeSet::new(), &folded(&["bob", "carol"]));
        assert_eq!(plan.added, [login("bob"), login("carol")].into());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn already_requested_is_ignored_case_insensitively() {
        let state = attention(&[("Bob", "alice")]);
        let plan = plan_reviewers(&state, &[login("bob")].into(), &folded(&["bob"]));
        assert_eq!(plan, ReviewerPlan::default());
    }

    #[test]
    fn non_collaborators_are_skipped() {
        let state = attention(&[("outsider", "alice"), ("bob", "alice")]);
        let plan = plan_reviewers(&state, &BTreeSet::new(), &folded(&["bob"]));
        assert_eq!(plan.added, [login("bob")].into());
        assert_eq!(plan.skipped, [login("outsider")].into());
    }

    #[test]
    fn self_requested_attention_is_not_a_review_request() {
        let state = attention(&[("alice", "alice"), ("bob", "bob"), ("bob", "carol")]);
        let plan = plan_reviewers(&state, &BTreeSet::new(), &folded(&["alice", "bob"]));
        assert_eq!(plan.added, [login("bob")].into());
    }

    #[tokio::test]
    async fn assignment_keeps_existing_requests() {
        let github = FakeGitHub::new();
        github.insert_pull_request(PrNumber(3), "[FLINK-3] Change");
        github.set_collaborators(&["existing", "bob"]);
        let executor = EffectExecutor::new(github);
        let cache = CollaboratorCache::new();
        let state = attention(&[("bob", "alice")]);

        let plan = assign_reviewers(
            &executor,
            &cache,
            &RepoId::new("apache", "flink"),
            PrNumber(3),
            &[login("existing")].into(),
            &state,
        )
        .await
        .unwrap();

        assert_eq!(plan.added, [login("bob")].into());
        let requests: Vec<_> = executor
            .interpreter()
            .effects()
            .into_iter()
            .filter_map(|e| match e {
                GitHubEffect::RequestReviewers { reviewers, .. } => Some(reviewers),
                _ => None,
            })
            .collect();
        assert_eq!(
            requests,
            vec![BTreeSet::from([login("bob"), login("existing")])]
        );
    }

    #[tokio::test]
    async fn nothing_new_means_no_request() {
        let github = FakeGitHub::new();
        github.insert_pull_request(PrNumber(3), "[FLINK-3] Change");
        github.set_collaborators(&["bob"]);
        let executor = EffectExecutor::new(github);
        let state = attention(&[("bob", "alice")]);

        assign_reviewers(
            &executor,
            &CollaboratorCache::new(),
            &RepoId::new("apache", "flink"),
            PrNumber(3),
            &[login("bob")].into(),
            &state,
        )
        .await
        .unwrap();

        assert!(
            !executor
                .interpreter()
                .effects()
                .iter()
                .any(|e| matches!(e, GitHubEffect::RequestReviewers { .. }))
        );
    }

    #[tokio::test]
    async fn collaborators_are_listed_once_per_repository() {
        let github = FakeGitHub::new();
        github.set_collaborators(&["bob"]);
        let executor = EffectExecutor::new(github);
        let cache = CollaboratorCache::new();
        let repo = RepoId::new("apache", "flink");

        cache.collaborators(&executor, &repo).await.unwrap();
        cache.collaborators(&executor, &repo).await.unwrap();

        let listings = executor
            .interpreter()
            .effects()
            .iter()
            .filter(|e| matches!(e, GitHubEffect::ListCollaborators))
            .count();
        assert_eq!(listings, 1);
    }
}
