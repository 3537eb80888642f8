//! On-disk caches and their invalidation.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   __last-invalidator-run   # invalidation cursor, epoch milliseconds
//!   components/<key>         # ticket id -> component names
//!   pr-labels/<key>          # pull request number -> labels
//! ```
//!
//! Entry file names are the URL-safe base64 encoding of the logical key.
//! Every entry is an independent JSON document; there are no cross-entry
//! transactions and the last writer wins.

pub mod cursor;
pub mod disk;
pub mod pr_labels;
pub mod sweep;

pub use cursor::{CursorError, CursorState, InvalidationCursor};
pub use disk::{CacheEntry, DiskKeyValueCache};
pub use pr_labels::PrLabelCache;
pub use sweep::{SweepError, SweepOutcome, run_sweep};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Directory of the ticket component cache below the data directory.
pub const COMPONENTS_DIR: &str = "components";

/// Directory of the pull request label cache below the data directory.
pub const PR_LABELS_DIR: &str = "pr-labels";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize cache entry")]
    Serialize(#[from] serde_json::Error),

    #[error("cache keys must not be empty")]
    EmptyKey,
}
