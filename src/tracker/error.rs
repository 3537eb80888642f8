//! Ticket tracker errors.

use thiserror::Error;

use crate::cache::CacheError;
use crate::types::TicketId;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The request could not be sent or its response not read.
    #[error("request to {endpoint} failed")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The tracker answered with an unexpected status.
    #[error("{endpoint} answered HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("ticket {0} does not exist")]
    NotFound(TicketId),

    /// The tracker could not be reached within the retry budget.
    #[error("ticket tracker unavailable after {attempts} attempts")]
    Remote {
        attempts: u32,
        #[source]
        last: Box<TrackerError>,
    },

    /// Shutdown was requested while waiting to retry.
    #[error("cancelled while waiting for the ticket tracker")]
    Cancelled,

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl TrackerError {
    /// Whether another attempt could succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, TrackerError::Http { .. } | TrackerError::Status { .. })
    }
}
