//! Typed execution of GitHub effects.
//!
//! `EffectExecutor` wraps an interpreter and pairs each effect with the
//! response shape it must produce, so callers work with `Vec<CommentData>`
//! instead of matching on `GitHubResponse` at every call site.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::trace;

use super::github::{
    CommentData, GitHubEffect, GitHubResponse, LabelData, NotificationData, PrData, PrListState,
    PrSummary, ReviewData,
};
use super::interpreter::GitHubInterpreter;
use crate::github::{GitHubApiError, GitHubErrorKind};
use crate::types::{CommentId, Login, PrNumber, ThreadId};

/// Errors from effect execution.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error(transparent)]
    GitHub(#[from] GitHubApiError),

    /// The interpreter answered with a response of the wrong shape.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse {
        effect: &'static str,
        response: String,
    },
}

impl EffectError {
    /// Whether the remote resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EffectError::GitHub(e) if e.kind == GitHubErrorKind::NotFound)
    }
}

fn unexpected(effect: &'static str, response: GitHubResponse) -> EffectError {
    EffectError::UnexpectedResponse {
        effect,
        response: format!("{response:?}"),
    }
}

/// Executes effects through an interpreter and unpacks their responses.
pub struct EffectExecutor<G> {
    github: G,
}

impl<G: GitHubInterpreter> EffectExecutor<G> {
    pub fn new(github: G) -> Self {
        EffectExecutor { github }
    }

    /// The wrapped interpreter.
    pub fn interpreter(&self) -> &G {
        &self.github
    }

    async fn run(&self, effect: GitHubEffect) -> Result<GitHubResponse, EffectError> {
        trace!(?effect, "interpreting effect");
        Ok(self.github.interpret(effect).await?)
    }

    async fn run_mutation(
        &self,
        name: &'static str,
        effect: GitHubEffect,
    ) -> Result<(), EffectError> {
        match self.run(effect).await? {
            GitHubResponse::Done => Ok(()),
            other => Err(unexpected(name, other)),
        }
    }

    pub async fn list_pull_requests(
        &self,
        state: PrListState,
    ) -> Result<Vec<PrSummary>, EffectError> {
        match self.run(GitHubEffect::ListPullRequests { state }).await? {
            GitHubResponse::PullRequestList(prs) => Ok(prs),
            other => Err(unexpected("ListPullRequests", other)),
        }
    }

    pub async fn get_pull_request(&self, pr: PrNumber) -> Result<PrData, EffectError> {
        match self.run(GitHubEffect::GetPullRequest { pr }).await? {
            GitHubResponse::PullRequest(data) => Ok(data),
            other => Err(unexpected("GetPullRequest", other)),
        }
    }

    pub async fn list_files(&self, pr: PrNumber) -> Result<Vec<String>, EffectError> {
        match self.run(GitHubEffect::ListFiles { pr }).await? {
            GitHubResponse::Files(files) => Ok(files),
            other => Err(unexpected("ListFiles", other)),
        }
    }

    pub async fn request_reviewers(
        &self,
        pr: PrNumber,
        reviewers: BTreeSet<Login>,
    ) -> Result<(), EffectError> {
        self.run_mutation(
            "RequestReviewers",
            GitHubEffect::RequestReviewers { pr, reviewers },
        )
        .await
    }

    pub async fn list_comments(&self, pr: PrNumber) -> Result<Vec<CommentData>, EffectError> {
        match self.run(GitHubEffect::ListComments { pr }).await? {
            GitHubResponse::Comments(comments) => Ok(comments),
            other => Err(unexpected("ListComments", other)),
        }
    }

    pub async fn list_reviews(&self, pr: PrNumber) -> Result<Vec<ReviewData>, EffectError> {
        match self.run(GitHubEffect::ListReviews { pr }).await? {
            GitHubResponse::Reviews(reviews) => Ok(reviews),
            other => Err(unexpected("ListReviews", other)),
        }
    }

    pub async fn post_comment(&self, pr: PrNumber, body: String) -> Result<CommentId, EffectError> {
        match self.run(GitHubEffect::PostComment { pr, body }).await? {
            GitHubResponse::CommentPosted { id } => Ok(id),
            other => Err(unexpected("PostComment", other)),
        }
    }

    pub async fn update_comment(
        &self,
        comment_id: CommentId,
        body: String,
    ) -> Result<(), EffectError> {
        self.run_mutation(
            "UpdateComment",
            GitHubEffect::UpdateComment { comment_id, body },
        )
        .await
    }

    pub async fn get_labels(&self, pr: PrNumber) -> Result<Vec<String>, EffectError> {
        match self.run(GitHubEffect::GetLabels { pr }).await? {
            GitHubResponse::Labels(labels) => Ok(labels),
            other => Err(unexpected("GetLabels", other)),
        }
    }

    pub async fn add_labels(&self, pr: PrNumber, labels: Vec<String>) -> Result<(), EffectError> {
        self.run_mutation("AddLabels", GitHubEffect::AddLabels { pr, labels })
            .await
    }

    pub async fn remove_label(&self, pr: PrNumber, label: String) -> Result<(), EffectError> {
        self.run_mutation("RemoveLabel", GitHubEffect::RemoveLabel { pr, label })
            .await
    }

    pub async fn get_label(&self, name: String) -> Result<LabelData, EffectError> {
        match self.run(GitHubEffect::GetLabel { name }).await? {
            GitHubResponse::Label(label) => Ok(label),
            other => Err(unexpected("GetLabel", other)),
        }
    }

    pub async fn create_label(&self, name: String, color: String) -> Result<LabelData, EffectError> {
        match self.run(GitHubEffect::CreateLabel { name, color }).await? {
            GitHubResponse::Label(label) => Ok(label),
            other => Err(unexpected("CreateLabel", other)),
        }
    }

    /// Fetches a label, creating it when absent.
    ///
    /// A failed create is followed by one more fetch: the label may exist
    /// remotely without being visible to the first fetch yet.
    pub async fn get_or_create_label(
        &self,
        name: &str,
        color: &str,
    ) -> Result<LabelData, EffectError> {
        match self.get_label(name.to_string()).await {
            Ok(label) => return Ok(label),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        match self.create_label(name.to_string(), color.to_string()).await {
            Ok(label) => Ok(label),
            Err(create_error) => {
                trace!(label = name, error = %create_error, "label creation failed, fetching again");
                self.get_label(name.to_string())
                    .await
                    .map_err(|_| create_error)
            }
        }
    }

    pub async fn list_collaborators(&self) -> Result<Vec<Login>, EffectError> {
        match self.run(GitHubEffect::ListCollaborators).await? {
            GitHubResponse::Collaborators(logins) => Ok(logins),
            other => Err(unexpected("ListCollaborators", other)),
        }
    }

    pub async fn list_notifications(&self) -> Result<Vec<NotificationData>, EffectError> {
        match self.run(GitHubEffect::ListNotifications).await? {
            GitHubResponse::Notifications(notifications) => Ok(notifications),
            other => Err(unexpected("ListNotifications", other)),
        }
    }

    pub async fn mark_notification_read(&self, thread_id: ThreadId) -> Result<(), EffectError> {
        self.run_mutation(
            "MarkNotificationRead",
            GitHubEffect::MarkNotificationRead { thread_id },
        )
        .await
    }

    /// Remaining and total core API requests for the current window.
    pub async fn rate_limit(&self) -> Result<(u64, u64), EffectError> {
        match self.run(GitHubEffect::GetRateLimit).await? {
            GitHubResponse::RateLimit { remaining, limit } => Ok((remaining, limit)),
            other => Err(unexpected("GetRateLimit", other)),
        }
    }
}
