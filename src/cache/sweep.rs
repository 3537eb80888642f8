//! The invalidation sweep.
//!
//! Asks the ticket tracker for everything changed since the cursor and evicts
//! the matching component cache entries. Evicting an absent entry is a no-op,
//! so sweeping a window twice is harmless; skipping part of one is not. The
//! cursor therefore only moves once every eviction succeeded.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::cursor::{CursorError, InvalidationCursor};
use super::disk::DiskKeyValueCache;
use super::CacheError;
use crate::tracker::{TicketTracker, TrackerError};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("failed to query changed tickets")]
    Tracker(#[from] TrackerError),

    #[error("failed to evict cache entry")]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The cursor was cold and has been initialised; nothing was swept.
    Bootstrapped { cursor: DateTime<Utc> },
    Swept {
        since: DateTime<Utc>,
        cursor: DateTime<Utc>,
        changed: usize,
        evicted: usize,
    },
}

/// Runs one sweep starting at `now`.
///
/// On error the cursor keeps its previous value and the next sweep covers
/// the same window again.
#[instrument(skip_all)]
pub async fn run_sweep<T, V>(
    cursor: &mut InvalidationCursor,
    tracker: &T,
    cache: &DiskKeyValueCache<V>,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, SweepError>
where
    T: TicketTracker,
    V: serde::Serialize + serde::de::DeserializeOwned,
{
    let Some(since) = cursor.begin(now)? else {
        return Ok(SweepOutcome::Bootstrapped { cursor: now });
    };

    match evict_changed(tracker, cache, since).await {
        Ok((changed, evicted)) => {
            let next = cursor.complete()?;
            info!(%since, cursor = %next, changed, evicted, "invalidation sweep complete");
            Ok(SweepOutcome::Swept {
                since,
                cursor: next,
                changed,
                evicted,
            })
        }
        Err(e) => {
            cursor.abort();
            warn!(%since, error = %e, "invalidation sweep failed, cursor unchanged");
            Err(e)
        }
    }
}

async fn evict_changed<T, V>(
    tracker: &T,
    cache: &DiskKeyValueCache<V>,
    since: DateTime<Utc>,
) -> Result<(usize, usize), SweepError>
where
    T: TicketTracker,
    V: serde::Serialize + serde::de::DeserializeOwned,
{
    let changed = tracker.search_changed_since(since).await?;
    let mut evicted = 0;
    for id in &changed {
        if cache.remove(id.as_str())? {
            evicted += 1;
        }
    }
    Ok((changed.len(), evicted))
}
