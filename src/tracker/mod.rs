//! The ticket tracker (Jira) collaborator.
//!
//! - [`JiraClient`] talks to the Jira REST API.
//! - [`RetryingTracker`] retries failed lookups with a fixed delay, reconnecting
//!   between attempts, and can be interrupted on shutdown.
//! - [`CachedComponents`] serves ticket components from the disk cache and
//!   only asks the tracker on a miss.

mod cached;
mod client;
mod error;
mod retry;

pub use cached::CachedComponents;
pub use client::{JiraClient, JiraConnector};
pub use error::TrackerError;
pub use retry::{RetryConfig, RetryingTracker};

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TicketId;

/// The fields of a ticket the bot reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketIssue {
    pub id: TicketId,
    /// Component names, in tracker order.
    pub components: Vec<String>,
    pub assignee: Option<String>,
}

/// Read access to a ticket tracker project.
pub trait TicketTracker: Send + Sync {
    fn get_issue(
        &self,
        id: &TicketId,
    ) -> impl Future<Output = Result<TicketIssue, TrackerError>> + Send;

    /// Tickets of the project updated at or after `since`, oldest first.
    fn search_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TicketId>, TrackerError>> + Send;
}

impl<T: TicketTracker> TicketTracker for Arc<T> {
    fn get_issue(
        &self,
        id: &TicketId,
    ) -> impl Future<Output = Result<TicketIssue, TrackerError>> + Send {
        (**self).get_issue(id)
    }

    fn search_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TicketId>, TrackerError>> + Send {
        (**self).search_changed_since(since)
    }
}

/// Creates tracker connections, so a connection that failed can be thrown
/// away and replaced.
pub trait TrackerConnector: Send + Sync {
    type Tracker: TicketTracker;

    fn connect(&self) -> Result<Self::Tracker, TrackerError>;
}
