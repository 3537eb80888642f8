//! Shared test doubles and arbitrary generators for property-based testing.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::effects::{
    CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, LabelData, NotificationData,
    PrData, PrSummary, ReviewData,
};
use crate::github::GitHubApiError;
use crate::tracker::{TicketIssue, TicketTracker, TrackerConnector, TrackerError};
use crate::types::{CommentId, Login, PrNumber, Sha, ThreadId, TicketId};

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    any::<u64>().prop_map(PrNumber)
}

pub fn arb_sha() -> impl Strategy<Value = Sha> {
    "[0-9a-f]{40}".prop_map(|s| Sha::parse(s).unwrap())
}

pub fn arb_login() -> impl Strategy<Value = Login> {
    "[a-zA-Z][a-zA-Z0-9-]{0,38}".prop_map(Login::new)
}

/// Whole seconds between 2001 and 2033, the range GitHub timestamps live in.
pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (1_000_000_000i64..2_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

// ─── FakeGitHub ───────────────────────────────────────────────────────────────

/// The login the fake posts comments as.
pub const FAKE_BOT: &str = "flinkbot";

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap()
}

#[derive(Debug)]
struct FakePull {
    title: String,
    head: Sha,
    files: Vec<String>,
    labels: Vec<String>,
    requested: BTreeSet<Login>,
    comments: Vec<CommentData>,
    reviews: Vec<ReviewData>,
}

#[derive(Debug, Default)]
struct FakeState {
    effects: Vec<GitHubEffect>,
    pulls: BTreeMap<PrNumber, FakePull>,
    labels: BTreeMap<String, String>,
    hidden_labels: BTreeSet<String>,
    canned: VecDeque<GitHubResponse>,
    collaborators: Vec<Login>,
    notifications: Vec<NotificationData>,
    next_comment_id: u64,
    ticks: i64,
}

impl FakeState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        epoch() + Duration::minutes(self.ticks)
    }

    fn pull(&mut self, pr: PrNumber) -> Result<&mut FakePull, GitHubApiError> {
        self.pulls
            .get_mut(&pr)
            .ok_or_else(|| GitHubApiError::not_found(format!("pull request {pr}")))
    }

    fn comment(&mut self, pr: PrNumber, author: &str, body: &str) -> CommentId {
        self.next_comment_id += 1;
        let id = CommentId(1000 + self.next_comment_id);
        let created_at = self.tick();
        if let Some(pull) = self.pulls.get_mut(&pr) {
            pull.comments.push(CommentData {
                id,
                author: Login::new(author),
                body: body.to_string(),
                created_at,
            });
        }
        id
    }

    fn respond(&mut self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        if let Some(canned) = self.canned.pop_front() {
            return Ok(canned);
        }

        match effect {
            GitHubEffect::ListPullRequests { .. } => Ok(GitHubResponse::PullRequestList(
                self.pulls
                    .iter()
                    .rev()
                    .map(|(number, pull)| PrSummary {
                        number: *number,
                        title: pull.title.clone(),
                        updated_at: epoch(),
                    })
                    .collect(),
            )),
            GitHubEffect::GetPullRequest { pr } => {
                let pull = self.pull(pr)?;
                Ok(GitHubResponse::PullRequest(PrData {
                    number: pr,
                    title: pull.title.clone(),
                    head_sha: pull.head.clone(),
                    requested_reviewers: pull.requested.clone(),
                    updated_at: epoch(),
                }))
            }
            GitHubEffect::ListFiles { pr } => Ok(GitHubResponse::Files(self.pull(pr)?.files.clone())),
            GitHubEffect::RequestReviewers { pr, reviewers } => {
                self.pull(pr)?.requested.extend(reviewers);
                Ok(GitHubResponse::Done)
            }
            GitHubEffect::ListComments { pr } => {
                Ok(GitHubResponse::Comments(self.pull(pr)?.comments.clone()))
            }
            GitHubEffect::ListReviews { pr } => {
                Ok(GitHubResponse::Reviews(self.pull(pr)?.reviews.clone()))
            }
            GitHubEffect::PostComment { pr, body } => {
                self.pull(pr)?;
                let id = self.comment(pr, FAKE_BOT, &body);
                Ok(GitHubResponse::CommentPosted { id })
            }
            GitHubEffect::UpdateComment { comment_id, body } => {
                let comment = self
                    .pulls
                    .values_mut()
                    .flat_map(|pull| pull.comments.iter_mut())
                    .find(|comment| comment.id == comment_id)
                    .ok_or_else(|| GitHubApiError::not_found(format!("comment {comment_id}")))?;
                comment.body = body;
                Ok(GitHubResponse::Done)
            }
            GitHubEffect::GetLabels { pr } => Ok(GitHubResponse::Labels(self.pull(pr)?.labels.clone())),
            GitHubEffect::AddLabels { pr, labels } => {
                let pull = self.pull(pr)?;
                for label in labels {
                    if !pull.labels.contains(&label) {
                        pull.labels.push(label);
                    }
                }
                Ok(GitHubResponse::Done)
            }
            GitHubEffect::RemoveLabel { pr, label } => {
                let pull = self.pull(pr)?;
                let before = pull.labels.len();
                pull.labels.retain(|l| *l != label);
                if pull.labels.len() == before {
                    return Err(GitHubApiError::not_found(format!("label {label} on {pr}")));
                }
                Ok(GitHubResponse::Done)
            }
            GitHubEffect::GetLabel { name } => {
                if self.hidden_labels.remove(&name) {
                    return Err(GitHubApiError::not_found(format!("label {name}")));
                }
                match self.labels.get(&name) {
                    Some(color) => Ok(GitHubResponse::Label(LabelData {
                        name,
                        color: color.clone(),
                    })),
                    None => Err(GitHubApiError::not_found(format!("label {name}"))),
                }
            }
            GitHubEffect::CreateLabel { name, color } => {
                if self.labels.contains_key(&name) {
                    return Err(GitHubApiError::permanent(format!(
                        "Validation Failed: label {name} already_exists"
                    )));
                }
                self.labels.insert(name.clone(), color.clone());
                Ok(GitHubResponse::Label(LabelData { name, color }))
            }
            GitHubEffect::ListCollaborators => {
                Ok(GitHubResponse::Collaborators(self.collaborators.clone()))
            }
            GitHubEffect::ListNotifications => {
                Ok(GitHubResponse::Notifications(self.notifications.clone()))
            }
            GitHubEffect::MarkNotificationRead { thread_id } => {
                let notification = self
                    .notifications
                    .iter_mut()
                    .find(|n| n.thread_id == thread_id)
                    .ok_or_else(|| GitHubApiError::not_found(format!("thread {thread_id}")))?;
                notification.unread = false;
                Ok(GitHubResponse::Done)
            }
            GitHubEffect::GetRateLimit => Ok(GitHubResponse::RateLimit {
                remaining: 4999,
                limit: 5000,
            }),
        }
    }
}

/// An in-memory GitHub repository that records every effect it interprets.
///
/// Clones share state, so a test can keep a handle after moving the fake
/// into an executor.
#[derive(Debug, Clone, Default)]
pub struct FakeGitHub {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.state().effects.clone()
    }

    /// Answers the next effect with `response`, whatever it is.
    pub fn answer_next_with(&self, response: GitHubResponse) {
        self.state().canned.push_back(response);
    }

    // ─── Repository labels ────────────────────────────────────────────────────

    pub fn insert_label(&self, name: &str, color: &str) {
        self.state().labels.insert(name.to_string(), color.to_string());
    }

    /// Makes the next fetch of `name` fail with `NotFound` even if it exists.
    pub fn hide_label_once(&self, name: &str) {
        self.state().hidden_labels.insert(name.to_string());
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.state().labels.contains_key(name)
    }

    // ─── Pull requests ────────────────────────────────────────────────────────

    pub fn insert_pull_request(&self, pr: PrNumber, title: &str) {
        self.state().pulls.insert(
            pr,
            FakePull {
                title: title.to_string(),
                head: Sha::parse("a".repeat(40)).unwrap(),
                files: Vec::new(),
                labels: Vec::new(),
                requested: BTreeSet::new(),
                comments: Vec::new(),
                reviews: Vec::new(),
            },
        );
    }

    fn with_pull(&self, pr: PrNumber, f: impl FnOnce(&mut FakePull)) {
        let mut state = self.state();
        let pull = state
            .pulls
            .get_mut(&pr)
            .unwrap_or_else(|| panic!("pull request {pr} not inserted"));
        f(pull);
    }

    pub fn set_head(&self, pr: PrNumber, head: Sha) {
        self.with_pull(pr, |pull| pull.head = head);
    }

    pub fn set_files(&self, pr: PrNumber, files: &[&str]) {
        self.with_pull(pr, |pull| {
            pull.files = files.iter().map(|f| f.to_string()).collect()
        });
    }

    pub fn attach_label(&self, pr: PrNumber, label: &str) {
        self.with_pull(pr, |pull| pull.labels.push(label.to_string()));
    }

    pub fn labels_on(&self, pr: PrNumber) -> Vec<String> {
        self.state()
            .pulls
            .get(&pr)
            .map(|pull| pull.labels.clone())
            .unwrap_or_default()
    }

    // ─── Thread ───────────────────────────────────────────────────────────────

    /// Adds an issue comment one minute after the previous comment or review.
    pub fn add_comment(&self, pr: PrNumber, author: &str, body: &str) -> CommentId {
        let mut state = self.state();
        assert!(state.pulls.contains_key(&pr), "pull request {pr} not inserted");
        state.comment(pr, author, body)
    }

    pub fn add_review(&self, pr: PrNumber, author: &str, body: &str) {
        let mut state = self.state();
        let submitted_at = state.tick();
        let pull = state
            .pulls
            .get_mut(&pr)
            .unwrap_or_else(|| panic!("pull request {pr} not inserted"));
        pull.reviews.push(ReviewData {
            author: Login::new(author),
            body: body.to_string(),
            submitted_at,
        });
    }

    // ─── Repository ───────────────────────────────────────────────────────────

    pub fn set_collaborators(&self, logins: &[&str]) {
        self.state().collaborators = logins.iter().map(Login::new).collect();
    }

    pub fn add_notification(&self, thread_id: &str, reason: &str, pr: Option<PrNumber>) {
        let title = match pr {
            Some(pr) => format!("Pull request {pr}"),
            None => "Repository notification".to_string(),
        };
        self.state().notifications.push(NotificationData {
            thread_id: ThreadId(thread_id.to_string()),
            reason: reason.to_string(),
            unread: true,
            pr,
            title,
        });
    }

    pub fn notification_is_read(&self, thread_id: &str) -> bool {
        self.state()
            .notifications
            .iter()
            .any(|n| n.thread_id.0 == thread_id && !n.unread)
    }
}

impl GitHubInterpreter for FakeGitHub {
    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        let mut state = self.state();
        state.effects.push(effect.clone());
        state.respond(effect)
    }
}

// ─── MockTracker ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct TrackerState {
    issues: HashMap<TicketId, TicketIssue>,
    changes: BTreeMap<TicketId, DateTime<Utc>>,
    failures: usize,
    connects: usize,
    get_calls: usize,
    search_calls: usize,
}

impl TrackerState {
    fn take_failure(&mut self, endpoint: &str) -> Result<(), TrackerError> {
        if self.failures == 0 {
            return Ok(());
        }
        self.failures -= 1;
        Err(TrackerError::Status {
            endpoint: endpoint.to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }
}

/// An in-memory ticket tracker that is also its own connector.
///
/// Clones share state; every attempt is counted, including failed ones.
#[derive(Debug, Clone, Default)]
pub struct MockTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap()
    }

    pub fn insert_issue(&self, issue: TicketIssue) {
        self.state().issues.insert(issue.id.clone(), issue);
    }

    /// Fails the next `n` calls of either kind with HTTP 503.
    pub fn fail_next(&self, n: usize) {
        self.state().failures = n;
    }

    /// Records that `id` changed at `at`.
    pub fn touch(&self, id: TicketId, at: DateTime<Utc>) {
        self.state().changes.insert(id, at);
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn get_calls(&self) -> usize {
        self.state().get_calls
    }

    pub fn search_calls(&self) -> usize {
        self.state().search_calls
    }
}

impl TicketTracker for MockTracker {
    async fn get_issue(&self, id: &TicketId) -> Result<TicketIssue, TrackerError> {
        let mut state = self.state();
        state.get_calls += 1;
        state.take_failure("/issue")?;
        state
            .issues
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.clone()))
    }

    async fn search_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<TicketId>, TrackerError> {
        let mut state = self.state();
        state.search_calls += 1;
        state.take_failure("/search")?;
        let mut changed: Vec<_> = state
            .changes
            .iter()
            .filter(|(_, at)| **at >= since)
            .map(|(id, at)| (*at, id.clone()))
            .collect();
        changed.sort();
        Ok(changed.into_iter().map(|(_, id)| id).collect())
    }
}

impl TrackerConnector for MockTracker {
    type Tracker = MockTracker;

    fn connect(&self) -> Result<MockTracker, TrackerError> {
        self.state().connects += 1;
        Ok(self.clone())
    }
}
