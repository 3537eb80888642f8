//! Per pull request orchestration.
//!
//! Every update replays the whole comment thread: events are ordered, folded
//! into an [`ApprovalState`], filtered by role and then rendered, labelled and
//! turned into review requests. Nothing about approvals is stored locally, so
//! a missed notification is repaired by the next one on the same pull request.
//!
//! Updates of the same pull request are serialized; different pull requests
//! may be processed concurrently. The new pull request scan is serialized on
//! its own lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::accumulate::accumulate;
use super::events::{Event, EventSource, order_events};
use super::labels::{LabelPlan, reconcile_review_label};
use super::render::{WarningsBlock, render, reusable_warnings};
use super::reviewers::{CollaboratorCache, ReviewerPlan, assign_reviewers};
use super::roles::Roles;
use super::template::TrackingTemplate;
use crate::checks::{CheckContext, PullRequestCheck, run_checks};
use crate::effects::{EffectError, EffectExecutor, GitHubInterpreter, PrData, PrListState};
use crate::tracker::{TicketIssue, TicketTracker, TrackerError};
use crate::types::{ApprovalState, CommentId, Login, PrNumber, RepoId, TicketId};

/// Notification reason GitHub uses for @-mentions.
pub const MENTION_REASON: &str = "mention";

/// Pause between marking a mention read and reading the thread, so that the
/// comment which triggered it is visible to the listing.
pub const MENTION_SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    GitHub(#[from] EffectError),

    #[error("failed to fetch the referenced ticket")]
    Tracker(#[from] TrackerError),
}

/// Immutable engine settings.
pub struct ReviewSettings {
    pub repo: RepoId,
    pub bot: Login,
    pub roles: Roles,
    /// Ticket tracker project key, as used in pull request titles.
    pub project: String,
    pub checks: Vec<Box<dyn PullRequestCheck>>,
}

/// What happened to the tracking comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingUpdate {
    /// The pull request has no tracking comment; nothing was done.
    Missing,
    Unchanged(CommentId),
    Updated(CommentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub tracking: TrackingUpdate,
    pub labels: LabelPlan,
    pub reviewers: ReviewerPlan,
}

impl UpdateOutcome {
    fn missing() -> Self {
        UpdateOutcome {
            tracking: TrackingUpdate::Missing,
            labels: LabelPlan::default(),
            reviewers: ReviewerPlan::default(),
        }
    }
}

/// Counters for one pass over pull requests or notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub seen: usize,
    pub acted: usize,
    pub failed: usize,
}

pub struct ReviewEngine<G, T> {
    github: Arc<EffectExecutor<G>>,
    tracker: T,
    settings: ReviewSettings,
    template: TrackingTemplate,
    collaborators: CollaboratorCache,
    scan_lock: Mutex<()>,
    pr_locks: Mutex<HashMap<PrNumber, Arc<Mutex<()>>>>,
}

impl<G: GitHubInterpreter, T: TicketTracker> ReviewEngine<G, T> {
    pub fn new(github: Arc<EffectExecutor<G>>, tracker: T, settings: ReviewSettings) -> Self {
        let template = TrackingTemplate::new(settings.bot.clone());
        ReviewEngine {
            github,
            tracker,
            settings,
            template,
            collaborators: CollaboratorCache::new(),
            scan_lock: Mutex::new(()),
            pr_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn template(&self) -> &TrackingTemplate {
        &self.template
    }

    pub fn github(&self) -> &EffectExecutor<G> {
        &self.github
    }

    /// The lock serializing work on `pr`.
    ///
    /// Locks nobody holds or waits for are dropped on the way, so the map
    /// only holds pull requests that are being processed.
    async fn pr_lock(&self, pr: PrNumber) -> Arc<Mutex<()>> {
        let mut locks = self.pr_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(pr).or_default())
    }

    fn find_tracking_comment<'a>(&self, events: &'a [Event]) -> Option<(CommentId, &'a str)> {
        events.iter().find_map(|event| match event.source {
            EventSource::Comment(id) if self.template.is_tracking_comment(&event.author, &event.body) => {
                Some((id, event.body.as_str()))
            }
            _ => None,
        })
    }

    // ─── New Pull Requests ────────────────────────────────────────────────────

    /// Posts the tracking comment on every open pull request that lacks one.
    #[instrument(skip(self), fields(repo = %self.settings.repo))]
    pub async fn check_for_new_prs(&self) -> Result<PassSummary, EngineError> {
        let _scan = self.scan_lock.lock().await;
        let pulls = self.github.list_pull_requests(PrListState::Open).await?;

        let mut summary = PassSummary::default();
        for pull in &pulls {
            summary.seen += 1;
            match self.bootstrap(pull.number).await {
                Ok(true) => {
                    summary.acted += 1;
                    info!(pr = %pull.number, title = %pull.title, "posted tracking comment");
                }
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!(pr = %pull.number, error = %e, "failed to post tracking comment");
                }
            }
        }
        info!(
            open = summary.seen,
            commented = summary.acted,
            failed = summary.failed,
            "done checking for new pull requests"
        );
        Ok(summary)
    }

    async fn bootstrap(&self, pr: PrNumber) -> Result<bool, EngineError> {
        let lock = self.pr_lock(pr).await;
        let _guard = lock.lock().await;

        let comments = self.github.list_comments(pr).await?;
        let has_tracking_comment = comments
            .iter()
            .any(|c| self.template.is_tracking_comment(&c.author, &c.body));
        if has_tracking_comment {
            return Ok(false);
        }

        self.github
            .post_comment(pr, self.template.body().to_string())
            .await?;
        reconcile_review_label(&self.github, pr, &ApprovalState::new()).await?;
        Ok(true)
    }

    // ─── Mentions ─────────────────────────────────────────────────────────────

    /// Handles unread notifications.
    ///
    /// Every notification is marked read before anything else happens, so a
    /// comment posted while the thread is processed raises a new one.
    #[instrument(skip(self), fields(repo = %self.settings.repo))]
    pub async fn process_mentions(&self) -> Result<PassSummary, EngineError> {
        let notifications = self.github.list_notifications().await?;

        let mut summary = PassSummary::default();
        for notification in notifications {
            if !notification.unread {
                debug!(title = %notification.title, "skipping read notification");
                continue;
            }
            summary.seen += 1;
            info!(title = %notification.title, reason = %notification.reason, "processing notification");

            if let Err(e) = self
                .github
                .mark_notification_read(notification.thread_id.clone())
                .await
            {
                summary.failed += 1;
                warn!(thread = %notification.thread_id, error = %e, "failed to mark notification read");
                continue;
            }

            let pr = match (notification.reason.as_str(), notification.pr) {
                (MENTION_REASON, Some(pr)) => pr,
                _ => continue,
            };

            tokio::time::sleep(MENTION_SETTLE_DELAY).await;
            match self.update_pull_request(pr).await {
                Ok(_) => summary.acted += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(%pr, error = %e, "failed to process mention");
                }
            }
        }
        Ok(summary)
    }

    // ─── Pull Request Update ──────────────────────────────────────────────────

    /// Re-derives the review state of `pr` and brings the tracking comment,
    /// the review label and the review requests in line with it.
    #[instrument(skip(self), fields(repo = %self.settings.repo))]
    pub async fn update_pull_request(&self, pr: PrNumber) -> Result<UpdateOutcome, EngineError> {
        let lock = self.pr_lock(pr).await;
        let _guard = lock.lock().await;

        let data = self.github.get_pull_request(pr).await?;
        let comments = self.github.list_comments(pr).await?;
        let reviews = self.github.list_reviews(pr).await?;
        let events = order_events(comments, reviews);
        debug!(%pr, events = events.len(), "processing pull request thread");

        let Some((comment_id, existing)) = self.find_tracking_comment(&events) else {
            warn!(%pr, "thread has no tracking comment, skipping");
            return Ok(UpdateOutcome::missing());
        };

        let mut state = accumulate(&events, self.template.bot());
        self.settings.roles.filter(&mut state);

        let warnings = match reusable_warnings(existing, &data.head_sha) {
            Some(block) => block,
            None => self.generate_warnings(&data).await?,
        };
        let body = render(&self.template, &state, &self.settings.roles, warnings);

        let tracking = if body == existing {
            TrackingUpdate::Unchanged(comment_id)
        } else {
            self.github.update_comment(comment_id, body).await?;
            info!(%pr, comment = %comment_id, "updated tracking comment");
            TrackingUpdate::Updated(comment_id)
        };

        let labels = reconcile_review_label(&self.github, pr, &state).await?;
        let reviewers = assign_reviewers(
            &self.github,
            &self.collaborators,
            &self.settings.repo,
            pr,
            &data.requested_reviewers,
            &state,
        )
        .await?;

        Ok(UpdateOutcome {
            tracking,
            labels,
            reviewers,
        })
    }

    async fn generate_warnings(&self, data: &PrData) -> Result<WarningsBlock, EngineError> {
        let files = self.github.list_files(data.number).await?;
        let ticket_id = TicketId::find_in(&data.title, &self.settings.project);
        let ticket = match &ticket_id {
            Some(id) => self.fetch_ticket(id).await?,
            None => None,
        };
        let ctx = CheckContext {
            title: data.title.clone(),
            files,
            ticket_id,
            ticket,
        };
        let warnings = run_checks(&self.settings.checks, &ctx);
        debug!(pr = %data.number, sha = %data.head_sha.short(), warnings = warnings.len(), "ran checks");
        Ok(WarningsBlock::generate(&data.head_sha, Utc::now(), &warnings))
    }

    /// The referenced ticket, or `None` when it does not exist or cannot be
    /// fetched. Only shutdown aborts the update.
    async fn fetch_ticket(&self, id: &TicketId) -> Result<Option<TicketIssue>, EngineError> {
        match self.tracker.get_issue(id).await {
            Ok(issue) => Ok(Some(issue)),
            Err(TrackerError::NotFound(_)) => {
                debug!(ticket = %id, "referenced ticket does not exist");
                Ok(None)
            }
            Err(TrackerError::Cancelled) => Err(TrackerError::Cancelled.into()),
            Err(e) => {
                warn!(ticket = %id, error = %e, "failed to fetch ticket, checking without it");
                Ok(None)
            }
        }
    }

    // ─── Rate Limit ───────────────────────────────────────────────────────────

    pub async fn log_rate_limit(&self) {
        match self.github.rate_limit().await {
            Ok((remaining, limit)) => info!(remaining, limit, "GitHub API requests remaining"),
            Err(e) => warn!(error = %e, "failed to query rate limit"),
        }
    }
}
