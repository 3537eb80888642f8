//! Fixed-delay retry around ticket tracker calls.
//!
//! A failed ticket lookup throws the current connection away and waits before
//! the next attempt, which runs on a freshly built connection. The change
//! search used by the invalidation sweep is not retried. The wait listens to a
//! [`CancellationToken`] so shutdown never blocks on a sleeping retry loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::TrackerError;
use super::{TicketIssue, TicketTracker, TrackerConnector};
use crate::types::TicketId;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Pause after each failed attempt.
    pub delay: Duration,
}

impl RetryConfig {
    pub const DEFAULT: Self = Self {
        attempts: 4,
        delay: Duration::from_secs(30),
    };
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A [`TicketTracker`] that retries failed ticket lookups on new connections.
///
/// Errors that cannot be fixed by retrying (a ticket that does not exist) are
/// returned immediately. Once all attempts fail the caller gets
/// [`TrackerError::Remote`] carrying the last failure.
pub struct RetryingTracker<C: TrackerConnector> {
    connector: C,
    current: Mutex<Option<Arc<C::Tracker>>>,
    config: RetryConfig,
    cancel: CancellationToken,
}

impl<C: TrackerConnector> RetryingTracker<C> {
    pub fn new(connector: C, config: RetryConfig, cancel: CancellationToken) -> Self {
        RetryingTracker {
            connector,
            current: Mutex::new(None),
            config,
            cancel,
        }
    }

    async fn connection(&self) -> Result<Arc<C::Tracker>, TrackerError> {
        let mut current = self.current.lock().await;
        if let Some(tracker) = current.as_ref() {
            return Ok(Arc::clone(tracker));
        }
        let tracker = Arc::new(self.connector.connect()?);
        *current = Some(Arc::clone(&tracker));
        Ok(tracker)
    }

    async fn discard_connection(&self) {
        self.current.lock().await.take();
    }

    async fn with_retry<R, F, Fut>(&self, operation: &'static str, call: F) -> Result<R, TrackerError>
    where
        F: Fn(Arc<C::Tracker>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<R, TrackerError>> + Send,
        R: Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match self.connection().await {
                Ok(tracker) => call(tracker).await,
                Err(e) => Err(e),
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retriable() => return Err(e),
                Err(e) => e,
            };

            self.discard_connection().await;
            if attempt >= self.config.attempts {
                warn!(operation, attempts = attempt, error = %error, "giving up on ticket tracker");
                return Err(TrackerError::Remote {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            warn!(
                operation,
                attempt,
                delay_secs = self.config.delay.as_secs(),
                error = %error,
                "ticket tracker call failed, retrying on a new connection"
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(operation, "retry interrupted by shutdown");
                    return Err(TrackerError::Cancelled);
                }
                _ = tokio::time::sleep(self.config.delay) => {}
            }
        }
    }
}

impl<C: TrackerConnector> TicketTracker for RetryingTracker<C> {
    async fn get_issue(&self, id: &TicketId) -> Result<TicketIssue, TrackerError> {
        self.with_retry("get_issue", |tracker| {
            let id = id.clone();
            async move { tracker.get_issue(&id).await }
        })
        .await
    }

    /// Runs once. A failed sweep keeps its window and the next scheduled
    /// sweep asks again.
    async fn search_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<TicketId>, TrackerError> {
        let result = self.connection().await?.search_changed_since(since).await;
        if let Err(e) = &result {
            if e.is_retriable() {
                self.discard_connection().await;
            }
        }
        result
    }
}
