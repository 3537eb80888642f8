//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The octocrab-backed interpreter in `crate::github` runs them against the
//! real API; tests run them against a recording fake.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CommentId, Login, PrNumber, Sha, ThreadId};

/// Which pull requests a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrListState {
    Open,
    All,
}

/// A GitHub API effect.
///
/// Each variant describes a GitHub API operation. Effects are repo-scoped:
/// the interpreter is constructed with a `RepoId`, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Pull Requests ────────────────────────────────────────────────────────
    /// List pull requests, most recently created first.
    ListPullRequests { state: PrListState },

    /// Fetch a single pull request.
    GetPullRequest { pr: PrNumber },

    /// List the paths touched by a pull request.
    ListFiles { pr: PrNumber },

    /// Ask for reviews. The list is the full desired set of new requests.
    RequestReviewers {
        pr: PrNumber,
        reviewers: BTreeSet<Login>,
    },

    // ─── Comments and Reviews ─────────────────────────────────────────────────
    /// List all issue comments on a pull request.
    ListComments { pr: PrNumber },

    /// List all submitted reviews on a pull request.
    ListReviews { pr: PrNumber },

    /// Post a new comment on a pull request.
    PostComment { pr: PrNumber, body: String },

    /// Replace the body of an existing comment.
    UpdateComment { comment_id: CommentId, body: String },

    // ─── Labels ───────────────────────────────────────────────────────────────
    /// Names of the labels currently attached to a pull request.
    GetLabels { pr: PrNumber },

    /// Attach labels to a pull request. The labels must already exist.
    AddLabels { pr: PrNumber, labels: Vec<String> },

    /// Detach one label from a pull request.
    RemoveLabel { pr: PrNumber, label: String },

    /// Fetch a repository label by name. Absent labels fail with `NotFound`.
    GetLabel { name: String },

    /// Create a repository label.
    CreateLabel { name: String, color: String },

    // ─── Repository ───────────────────────────────────────────────────────────
    /// List users with push access to the repository.
    ListCollaborators,

    // ─── Notifications ────────────────────────────────────────────────────────
    /// List unread notifications the bot participates in.
    ListNotifications,

    /// Mark a notification thread as read.
    MarkNotificationRead { thread_id: ThreadId },

    /// Query the remaining core API budget.
    GetRateLimit,
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// A pull request as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrSummary {
    pub number: PrNumber,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Pull request details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    pub number: PrNumber,
    pub title: String,
    /// The current head SHA.
    pub head_sha: Sha,
    /// Users whose review is currently requested.
    pub requested_reviewers: BTreeSet<Login>,
    pub updated_at: DateTime<Utc>,
}

/// Comment data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: CommentId,
    pub author: Login,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A submitted pull request review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewData {
    pub author: Login,
    /// Empty when the reviewer left no summary text.
    pub body: String,
    pub submitted_at: DateTime<Utc>,
}

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelData {
    pub name: String,
    pub color: String,
}

/// One notification thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub thread_id: ThreadId,
    /// GitHub's reason string, e.g. `mention` or `subscribed`.
    pub reason: String,
    pub unread: bool,
    /// The pull request the thread belongs to, if it is one.
    pub pr: Option<PrNumber>,
    pub title: String,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
/// Mutations answer with `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `ListPullRequests`.
    PullRequestList(Vec<PrSummary>),

    /// Response to `GetPullRequest`.
    PullRequest(PrData),

    /// Response to `ListFiles`.
    Files(Vec<String>),

    /// Response to `ListComments`.
    Comments(Vec<CommentData>),

    /// Response to `ListReviews`.
    Reviews(Vec<ReviewData>),

    /// Response to `PostComment`.
    CommentPosted { id: CommentId },

    /// Response to `GetLabels`.
    Labels(Vec<String>),

    /// Response to `GetLabel` and `CreateLabel`.
    Label(LabelData),

    /// Response to `ListCollaborators`.
    Collaborators(Vec<Login>),

    /// Response to `ListNotifications`.
    Notifications(Vec<NotificationData>),

    /// Response to `GetRateLimit`.
    RateLimit { remaining: u64, limit: u64 },

    /// Response to any effect that only changes remote state.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::test_utils::{arb_login, arb_pr_number, arb_sha, arb_timestamp};

    fn arb_comment_data() -> impl Strategy<Value = CommentData> {
        (any::<u64>(), arb_login(), ".{0,200}", arb_timestamp()).prop_map(
            |(id, author, body, created_at)| CommentData {
                id: CommentId(id),
                author,
                body,
                created_at,
            },
        )
    }

    fn arb_pr_data() -> impl Strategy<Value = PrData> {
        (
            arb_pr_number(),
            "[a-zA-Z0-9 \\[\\]-]{0,60}",
            arb_sha(),
            prop::collection::btree_set(arb_login(), 0..4),
            arb_timestamp(),
        )
            .prop_map(
                |(number, title, head_sha, requested_reviewers, updated_at)| PrData {
                    number,
                    title,
                    head_sha,
                    requested_reviewers,
                    updated_at,
                },
            )
    }

    fn arb_github_effect() -> impl Strategy<Value = GitHubEffect> {
        prop_oneof![
            Just(GitHubEffect::ListPullRequests {
                state: PrListState::Open
            }),
            arb_pr_number().prop_map(|pr| GitHubEffect::GetPullRequest { pr }),
            arb_pr_number().prop_map(|pr| GitHubEffect::ListComments { pr }),
            (arb_pr_number(), ".{0,200}")
                .prop_map(|(pr, body)| GitHubEffect::PostComment { pr, body }),
            (arb_pr_number(), prop::collection::btree_set(arb_login(), 1..4))
                .prop_map(|(pr, reviewers)| GitHubEffect::RequestReviewers { pr, reviewers }),
            (arb_pr_number(), prop::collection::vec("[a-z=?]{1,20}", 1..3))
                .prop_map(|(pr, labels)| GitHubEffect::AddLabels { pr, labels }),
            "[0-9]{1,10}".prop_map(|id| GitHubEffect::MarkNotificationRead {
                thread_id: ThreadId(id)
            }),
        ]
    }

    proptest! {
        #[test]
        fn effect_serde_roundtrip(effect in arb_github_effect()) {
            let json = serde_json::to_string(&effect).unwrap();
            let parsed: GitHubEffect = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(effect, parsed);
        }

        #[test]
        fn pr_data_serde_roundtrip(data in arb_pr_data()) {
            let response = GitHubResponse::PullRequest(data);
            let json = serde_json::to_string(&response).unwrap();
            let parsed: GitHubResponse = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(response, parsed);
        }

        #[test]
        fn comments_serde_roundtrip(comments in prop::collection::vec(arb_comment_data(), 0..5)) {
            let response = GitHubResponse::Comments(comments);
            let json = serde_json::to_string(&response).unwrap();
            let parsed: GitHubResponse = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(response, parsed);
        }
    }

    #[test]
    fn effects_are_tagged_by_type() {
        let json = serde_json::to_value(GitHubEffect::GetRateLimit).unwrap();
        assert_eq!(json["type"], "get_rate_limit");
    }
}
