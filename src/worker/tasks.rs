//! The bot's periodic tasks.
//!
//! The review tasks share one [`ReviewEngine`]; the labeler and the
//! invalidation sweep only meet through the component cache on disk.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use super::scheduler::PeriodicTask;
use crate::cache::{DiskKeyValueCache, InvalidationCursor, SweepOutcome, run_sweep};
use crate::effects::GitHubInterpreter;
use crate::labeler::ComponentLabeler;
use crate::review::ReviewEngine;
use crate::tracker::TicketTracker;

/// Posts tracking comments on new pull requests.
pub struct NewPullRequestScan<G, T> {
    pub engine: Arc<ReviewEngine<G, T>>,
}

impl<G: GitHubInterpreter, T: TicketTracker> PeriodicTask for NewPullRequestScan<G, T> {
    fn name(&self) -> &'static str {
        "new-pull-requests"
    }

    async fn run(&mut self) {
        if let Err(e) = self.engine.check_for_new_prs().await {
            error!(error = %e, "new pull request scan failed");
        }
        self.engine.log_rate_limit().await;
    }
}

/// Updates pull requests the bot was mentioned on.
pub struct MentionScan<G, T> {
    pub engine: Arc<ReviewEngine<G, T>>,
}

impl<G: GitHubInterpreter, T: TicketTracker> PeriodicTask for MentionScan<G, T> {
    fn name(&self) -> &'static str {
        "mentions"
    }

    async fn run(&mut self) {
        match self.engine.process_mentions().await {
            Ok(summary) if summary.seen > 0 => {
                info!(
                    notifications = summary.seen,
                    updated = summary.acted,
                    failed = summary.failed,
                    "processed notifications"
                );
                self.engine.log_rate_limit().await;
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "notification processing failed"),
        }
    }
}

/// Mirrors ticket components onto pull request labels.
pub struct ComponentLabeling<G, T> {
    pub labeler: ComponentLabeler<G, T>,
}

impl<G: GitHubInterpreter, T: TicketTracker> PeriodicTask for ComponentLabeling<G, T> {
    fn name(&self) -> &'static str {
        "component-labeler"
    }

    async fn run(&mut self) {
        match self.labeler.run_pass().await {
            Ok(pass) => info!(
                checked = pass.checked,
                updated = pass.updated,
                failed = pass.failed,
                "component labeler pass done"
            ),
            Err(e) => error!(error = %e, "component labeler pass failed"),
        }
    }
}

/// Evicts component cache entries of tickets changed since the last sweep.
pub struct CacheInvalidation<T> {
    pub cursor: InvalidationCursor,
    pub tracker: T,
    pub components: DiskKeyValueCache<Vec<String>>,
}

impl<T: TicketTracker> PeriodicTask for CacheInvalidation<T> {
    fn name(&self) -> &'static str {
        "cache-invalidation"
    }

    async fn run(&mut self) {
        match run_sweep(&mut self.cursor, &self.tracker, &self.components, Utc::now()).await {
            Ok(SweepOutcome::Bootstrapped { cursor }) => {
                info!(%cursor, "invalidation cursor initialised, first sweep skipped");
            }
            Ok(SweepOutcome::Swept { .. }) => {}
            Err(e) => error!(error = %e, "cache invalidation sweep failed"),
        }
    }
}
