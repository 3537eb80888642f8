//! Ticket components served from the disk cache.

use tracing::debug;

use super::error::TrackerError;
use super::TicketTracker;
use crate::cache::{CacheError, DiskKeyValueCache};
use crate::types::TicketId;

/// Component lookups that only reach the tracker on a cache miss.
///
/// Entries stay until the invalidation sweep evicts them. Failed lookups are
/// never cached, so an unreachable tracker cannot leave a ticket looking like
/// it has no components.
#[derive(Debug)]
pub struct CachedComponents<T> {
    tracker: T,
    cache: DiskKeyValueCache<Vec<String>>,
}

impl<T: TicketTracker> CachedComponents<T> {
    pub fn new(tracker: T, cache: DiskKeyValueCache<Vec<String>>) -> Self {
        CachedComponents { tracker, cache }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn cache(&self) -> &DiskKeyValueCache<Vec<String>> {
        &self.cache
    }

    pub async fn components(&self, id: &TicketId) -> Result<Vec<String>, TrackerError> {
        if let Some(components) = self.cache.get(id.as_str()) {
            debug!(ticket = %id, "component cache hit");
            return Ok(components);
        }
        let issue = self.tracker.get_issue(id).await?;
        self.cache.put(id.as_str(), issue.components.clone())?;
        Ok(issue.components)
    }

    pub fn invalidate(&self, id: &TicketId) -> Result<bool, CacheError> {
        self.cache.remove(id.as_str())
    }
}
