//! Pull request labels, cached against the pull request's `updated_at`.
//!
//! Any label change bumps the pull request's modification time, so an entry
//! whose recorded time is at least the current remote time is still exact.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::disk::{CacheEntry, DiskKeyValueCache};
use super::CacheError;
use crate::effects::{EffectError, EffectExecutor, GitHubInterpreter};
use crate::types::PrNumber;

fn key(pr: PrNumber) -> String {
    pr.0.to_string()
}

#[derive(Debug)]
pub struct PrLabelCache {
    entries: DiskKeyValueCache<Vec<String>>,
}

impl PrLabelCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Ok(PrLabelCache {
            entries: DiskKeyValueCache::open(dir)?,
        })
    }

    /// The cached labels, if the entry is at least as new as `remote_updated_at`.
    pub fn get(&self, pr: PrNumber, remote_updated_at: DateTime<Utc>) -> Option<Vec<String>> {
        let entry = self.entries.get_entry(&key(pr))?;
        match entry.last_updated_at {
            Some(cached_at) if cached_at >= remote_updated_at => Some(entry.value),
            _ => None,
        }
    }

    pub fn put(
        &self,
        pr: PrNumber,
        updated_at: DateTime<Utc>,
        labels: Vec<String>,
    ) -> Result<(), CacheError> {
        self.entries
            .put_entry(&CacheEntry::new(key(pr), labels).updated_at(updated_at))
    }

    pub fn remove(&self, pr: PrNumber) -> Result<bool, CacheError> {
        self.entries.remove(&key(pr))
    }

    /// The labels of `pr`, from the cache when valid and from GitHub otherwise.
    ///
    /// A failure to store the fetched labels is logged; it only costs a
    /// refetch next time.
    pub async fn labels<G: GitHubInterpreter>(
        &self,
        github: &EffectExecutor<G>,
        pr: PrNumber,
        remote_updated_at: DateTime<Utc>,
    ) -> Result<Vec<String>, EffectError> {
        if let Some(labels) = self.get(pr, remote_updated_at) {
            debug!(%pr, "label cache hit");
            return Ok(labels);
        }
        let labels = github.get_labels(pr).await?;
        if let Err(e) = self.put(pr, remote_updated_at, labels.clone()) {
            warn!(%pr, error = %e, "failed to cache pull request labels");
        }
        Ok(labels)
    }
}
