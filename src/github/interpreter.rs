//! GitHub effect interpreter using octocrab.
//!
//! List endpoints are paginated 100 items at a time until a short page is
//! returned. Most calls go through octocrab's raw REST helpers with small
//! response structs, so only the fields the bot reads are deserialized.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::effects::{
    CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, LabelData, NotificationData,
    PrData, PrListState, PrSummary, ReviewData,
};
use crate::types::{CommentId, Login, PrNumber, Sha, ThreadId};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

const PAGE_SIZE: usize = 100;

impl GitHubInterpreter for OctocrabClient {
    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        interpret_github_effect(self, effect).await
    }
}

/// Executes a single effect against the GitHub API.
///
/// Nothing is retried here: a failed call fails the current pass for the
/// affected pull request and is attempted again on the next scheduled pass.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::ListPullRequests { state } => list_pull_requests(client, state).await,
        GitHubEffect::GetPullRequest { pr } => get_pull_request(client, pr).await,
        GitHubEffect::ListFiles { pr } => list_files(client, pr).await,
        GitHubEffect::RequestReviewers { pr, reviewers } => {
            request_reviewers(client, pr, reviewers).await
        }
        GitHubEffect::ListComments { pr } => list_comments(client, pr).await,
        GitHubEffect::ListReviews { pr } => list_reviews(client, pr).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
        GitHubEffect::UpdateComment { comment_id, body } => {
            update_comment(client, comment_id, body).await
        }
        GitHubEffect::GetLabels { pr } => get_labels(client, pr).await,
        GitHubEffect::AddLabels { pr, labels } => add_labels(client, pr, labels).await,
        GitHubEffect::RemoveLabel { pr, label } => remove_label(client, pr, label).await,
        GitHubEffect::GetLabel { name } => get_label(client, name).await,
        GitHubEffect::CreateLabel { name, color } => create_label(client, name, color).await,
        GitHubEffect::ListCollaborators => list_collaborators(client).await,
        GitHubEffect::ListNotifications => list_notifications(client).await,
        GitHubEffect::MarkNotificationRead { thread_id } => {
            mark_notification_read(client, thread_id).await
        }
        GitHubEffect::GetRateLimit => get_rate_limit(client).await,
    }
}

// ─── Raw REST Helpers ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PageParams<'a> {
    per_page: usize,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    participating: Option<bool>,
}

impl PageParams<'_> {
    fn page(page: u32) -> Self {
        PageParams {
            per_page: PAGE_SIZE,
            page,
            state: None,
            participating: None,
        }
    }
}

/// Fetches every page of a list endpoint.
async fn get_all_pages<T: DeserializeOwned>(
    client: &OctocrabClient,
    route: &str,
    params: impl Fn(u32) -> PageParams<'static>,
) -> Result<Vec<T>, GitHubApiError> {
    let mut page = 1u32;
    let mut all = Vec::new();

    loop {
        let items: Vec<T> = client
            .inner()
            .get(route, Some(&params(page)))
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let is_last_page = items.len() < PAGE_SIZE;
        all.extend(items);
        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(all)
}

fn repo_route(client: &OctocrabClient, path: &str) -> String {
    format!("/repos/{}/{}/{}", client.owner(), client.repo_name(), path)
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
    #[serde(default)]
    color: String,
}

impl From<RawLabel> for LabelData {
    fn from(label: RawLabel) -> Self {
        LabelData {
            name: label.name,
            color: label.color,
        }
    }
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPullSummary {
    number: u64,
    #[serde(default)]
    title: String,
    updated_at: DateTime<Utc>,
}

async fn list_pull_requests(
    client: &OctocrabClient,
    state: PrListState,
) -> Result<GitHubResponse, GitHubApiError> {
    let state = match state {
        PrListState::Open => "open",
        PrListState::All => "all",
    };
    let pulls: Vec<RawPullSummary> =
        get_all_pages(client, &repo_route(client, "pulls"), |page| PageParams {
            state: Some(state),
            ..PageParams::page(page)
        })
        .await?;

    Ok(GitHubResponse::PullRequestList(
        pulls
            .into_iter()
            .map(|pull| PrSummary {
                number: PrNumber(pull.number),
                title: pull.title,
                updated_at: pull.updated_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawPull {
    number: u64,
    #[serde(default)]
    title: String,
    head: RawHead,
    #[serde(default)]
    requested_reviewers: Vec<RawUser>,
    updated_at: DateTime<Utc>,
}

async fn get_pull_request(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("pulls/{}", pr.0));
    let pull: RawPull = client
        .inner()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let head_sha = Sha::parse(&pull.head.sha)
        .map_err(|e| GitHubApiError::permanent(format!("Invalid head SHA on {pr}: {e}")))?;

    Ok(GitHubResponse::PullRequest(PrData {
        number: PrNumber(pull.number),
        title: pull.title,
        head_sha,
        requested_reviewers: pull
            .requested_reviewers
            .into_iter()
            .map(|user| Login::new(user.login))
            .collect(),
        updated_at: pull.updated_at,
    }))
}

#[derive(Debug, Deserialize)]
struct RawFile {
    filename: String,
}

async fn list_files(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("pulls/{}/files", pr.0));
    let files: Vec<RawFile> = get_all_pages(client, &route, PageParams::page).await?;
    Ok(GitHubResponse::Files(
        files.into_iter().map(|file| file.filename).collect(),
    ))
}

async fn request_reviewers(
    client: &OctocrabClient,
    pr: PrNumber,
    reviewers: BTreeSet<Login>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct ReviewRequest {
        reviewers: Vec<String>,
    }

    let route = repo_route(client, &format!("pulls/{}/requested_reviewers", pr.0));
    let request = ReviewRequest {
        reviewers: reviewers
            .iter()
            .map(|login| login.as_str().to_string())
            .collect(),
    };
    let _: serde_json::Value = client
        .inner()
        .post(&route, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Done)
}

// ─── Comments and Reviews ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    user: Option<RawUser>,
    body: Option<String>,
    created_at: DateTime<Utc>,
}

async fn list_comments(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("issues/{}/comments", pr.0));
    let comments: Vec<RawComment> = get_all_pages(client, &route, PageParams::page).await?;

    Ok(GitHubResponse::Comments(
        comments
            .into_iter()
            .filter_map(|comment| {
                // Comments by deleted accounts have no user; they cannot carry commands.
                let user = comment.user?;
                Some(CommentData {
                    id: CommentId(comment.id),
                    author: Login::new(user.login),
                    body: comment.body.unwrap_or_default(),
                    created_at: comment.created_at,
                })
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct RawReview {
    user: Option<RawUser>,
    body: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
}

async fn list_reviews(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("pulls/{}/reviews", pr.0));
    let reviews: Vec<RawReview> = get_all_pages(client, &route, PageParams::page).await?;

    Ok(GitHubResponse::Reviews(
        reviews
            .into_iter()
            .filter_map(|review| {
                // Pending reviews have no submission time and are invisible to others.
                let submitted_at = review.submitted_at?;
                Some(ReviewData {
                    author: Login::new(review.user?.login),
                    body: review.body.unwrap_or_default(),
                    submitted_at,
                })
            })
            .collect(),
    ))
}

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let comment = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentPosted {
        id: CommentId(comment.id.into_inner()),
    })
}

async fn update_comment(
    client: &OctocrabClient,
    comment_id: CommentId,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct UpdateRequest {
        body: String,
    }

    let route = repo_route(client, &format!("issues/comments/{}", comment_id.0));
    let _: serde_json::Value = client
        .inner()
        .patch(&route, Some(&UpdateRequest { body }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Done)
}

// ─── Labels ───────────────────────────────────────────────────────────────────

async fn get_labels(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("issues/{}/labels", pr.0));
    let labels: Vec<RawLabel> = get_all_pages(client, &route, PageParams::page).await?;
    Ok(GitHubResponse::Labels(
        labels.into_iter().map(|label| label.name).collect(),
    ))
}

async fn add_labels(
    client: &OctocrabClient,
    pr: PrNumber,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct AddLabelsRequest {
        labels: Vec<String>,
    }

    let route = repo_route(client, &format!("issues/{}/labels", pr.0));
    let _: Vec<RawLabel> = client
        .inner()
        .post(&route, Some(&AddLabelsRequest { labels }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Done)
}

async fn remove_label(
    client: &OctocrabClient,
    pr: PrNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    // Label names contain spaces, '=' and emoji.
    let route = repo_route(
        client,
        &format!("issues/{}/labels/{}", pr.0, urlencoding::encode(&label)),
    );
    let _: Vec<RawLabel> = client
        .inner()
        .delete(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Done)
}

async fn get_label(client: &OctocrabClient, name: String) -> Result<GitHubResponse, GitHubApiError> {
    let route = repo_route(client, &format!("labels/{}", urlencoding::encode(&name)));
    let label: RawLabel = client
        .inner()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Label(label.into()))
}

async fn create_label(
    client: &OctocrabClient,
    name: String,
    color: String,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct CreateLabelRequest {
        name: String,
        color: String,
    }

    let route = repo_route(client, "labels");
    let label: RawLabel = client
        .inner()
        .post(&route, Some(&CreateLabelRequest { name, color }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Label(label.into()))
}

// ─── Repository ───────────────────────────────────────────────────────────────

async fn list_collaborators(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let users: Vec<RawUser> =
        get_all_pages(client, &repo_route(client, "collaborators"), PageParams::page).await?;
    Ok(GitHubResponse::Collaborators(
        users.into_iter().map(|user| Login::new(user.login)).collect(),
    ))
}

// ─── Notifications ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawSubject {
    title: String,
    url: Option<String>,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RawNotification {
    id: String,
    reason: String,
    unread: bool,
    subject: RawSubject,
}

/// Extracts the pull request number from a notification subject URL such as
/// `https://api.github.com/repos/apache/flink/pulls/8291`.
fn pull_number_from_subject(subject: &RawSubject) -> Option<PrNumber> {
    if subject.kind != "PullRequest" {
        return None;
    }
    let url = subject.url.as_deref()?;
    let (_, number) = url.rsplit_once("/pulls/")?;
    number.parse().ok().map(PrNumber)
}

async fn list_notifications(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let notifications: Vec<RawNotification> =
        get_all_pages(client, "/notifications", |page| PageParams {
            participating: Some(true),
            ..PageParams::page(page)
        })
        .await?;

    Ok(GitHubResponse::Notifications(
        notifications
            .into_iter()
            .map(|notification| NotificationData {
                pr: pull_number_from_subject(&notification.subject),
                thread_id: ThreadId(notification.id),
                reason: notification.reason,
                unread: notification.unread,
                title: notification.subject.title,
            })
            .collect(),
    ))
}

async fn mark_notification_read(
    client: &OctocrabClient,
    thread_id: ThreadId,
) -> Result<GitHubResponse, GitHubApiError> {
    let id: u64 = thread_id.0.parse().map_err(|_| {
        GitHubApiError::permanent(format!("Invalid notification thread id {:?}", thread_id.0))
    })?;
    // Answers 205 with an empty body, which the typed helpers cannot deserialize.
    client
        .inner()
        .activity()
        .notifications()
        .mark_as_read(octocrab::models::NotificationId(id))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::Done)
}

async fn get_rate_limit(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let rate_limit = client
        .inner()
        .ratelimit()
        .get()
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    let core = rate_limit.resources.core;
    Ok(GitHubResponse::RateLimit {
        remaining: core.remaining as u64,
        limit: core.limit as u64,
    })
}
