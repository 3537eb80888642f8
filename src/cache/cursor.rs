//! The invalidation cursor: when the last complete sweep started.
//!
//! ```text
//!  Cold ──begin──▶ Settled(now)          (bootstrap, nothing swept)
//!  Settled(t) ──begin──▶ Running { since: t, started_at }
//!  Running ──complete──▶ Settled(max(t, started_at))   (persisted)
//!  Running ──abort──▶ Settled(t)                        (file untouched)
//! ```
//!
//! The file holds the instant as decimal epoch milliseconds. It is rewritten
//! only when a sweep completes, so a crash mid-sweep leaves the old window in
//! place and the next sweep covers it again.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::persistence::write_atomic;

pub const CURSOR_FILE_NAME: &str = "__last-invalidator-run";

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("failed to access cursor file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cursor file {path} holds {content:?}, not an epoch millisecond timestamp")]
    Corrupt { path: PathBuf, content: String },

    #[error("cursor is {state}, expected {expected}")]
    InvalidTransition {
        state: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No sweep ever completed.
    Cold,
    /// Everything changed before this instant has been evicted.
    Settled(DateTime<Utc>),
    /// A sweep over `since..` is in progress.
    Running {
        since: DateTime<Utc>,
        started_at: DateTime<Utc>,
    },
}

impl CursorState {
    fn name(&self) -> &'static str {
        match self {
            CursorState::Cold => "cold",
            CursorState::Settled(_) => "settled",
            CursorState::Running { .. } => "running",
        }
    }
}

#[derive(Debug)]
pub struct InvalidationCursor {
    path: PathBuf,
    state: CursorState,
}

impl InvalidationCursor {
    /// Loads the cursor stored in `data_dir`.
    ///
    /// A missing file means [`CursorState::Cold`]. An unparseable file is an
    /// error: guessing a value could skip evictions.
    pub fn open(data_dir: &Path) -> Result<Self, CursorError> {
        let path = data_dir.join(CURSOR_FILE_NAME);
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => CursorState::Settled(parse_millis(&path, &content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => CursorState::Cold,
            Err(source) => return Err(CursorError::Io { path, source }),
        };
        Ok(InvalidationCursor { path, state })
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts a sweep at `now`, returning the instant to sweep from.
    ///
    /// A cold cursor is initialised to `now` instead and `None` is returned:
    /// without a previous run there is no window to sweep, and entries cached
    /// before this point cannot be validated.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, CursorError> {
        match self.state {
            CursorState::Cold => {
                self.persist(now)?;
                warn!("#####################################################");
                warn!("## No invalidation cursor found at {}", self.path.display());
                warn!("## Initialising it to {now}.");
                warn!("## Cache entries written before this may be stale;");
                warn!("## clear the cache directories if in doubt.");
                warn!("#####################################################");
                self.state = CursorState::Settled(now);
                Ok(None)
            }
            CursorState::Settled(since) => {
                self.state = CursorState::Running {
                    since,
                    started_at: now,
                };
                Ok(Some(since))
            }
            CursorState::Running { .. } => Err(self.invalid("settled or cold")),
        }
    }

    /// Marks the running sweep as done and persists its start time.
    ///
    /// The cursor never moves backwards, even if the clock did.
    pub fn complete(&mut self) -> Result<DateTime<Utc>, CursorError> {
        let CursorState::Running { since, started_at } = self.state else {
            return Err(self.invalid("running"));
        };
        let next = since.max(started_at);
        self.persist(next)?;
        self.state = CursorState::Settled(next);
        info!(cursor = %next, "invalidation cursor advanced");
        Ok(next)
    }

    /// Abandons the running sweep, keeping the previous cursor.
    pub fn abort(&mut self) {
        if let CursorState::Running { since, .. } = self.state {
            self.state = CursorState::Settled(since);
        }
    }

    fn persist(&self, at: DateTime<Utc>) -> Result<(), CursorError> {
        write_atomic(&self.path, at.timestamp_millis().to_string().as_bytes()).map_err(|source| {
            CursorError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn invalid(&self, expected: &'static str) -> CursorError {
        CursorError::InvalidTransition {
            state: self.state.name(),
            expected,
        }
    }
}

fn parse_millis(path: &Path, content: &str) -> Result<DateTime<Utc>, CursorError> {
    content
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .ok_or_else(|| CursorError::Corrupt {
            path: path.to_path_buf(),
            content: content.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 1, 12, minute, 0).unwrap()
    }

    fn stored(dir: &Path) -> String {
        std::fs::read_to_string(dir.join(CURSOR_FILE_NAME)).unwrap()
    }

    #[test]
    fn cold_cursor_initialises_and_skips() {
        let dir = tempdir().unwrap();
        let mut cursor = InvalidationCursor::open(dir.path()).unwrap();
        assert_eq!(cursor.state(), CursorState::Cold);

        assert_eq!(cursor.begin(at(0)).unwrap(), None);

        assert_eq!(cursor.state(), CursorState::Settled(at(0)));
        assert_eq!(stored(dir.path()), at(0).timestamp_millis().to_string());
    }

    #[test]
    fn completed_sweep_advances_to_its_start() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CURSOR_FILE_NAME),
            at(0).timestamp_millis().to_string(),
        )
        .unwrap();
        let mut cursor = InvalidationCursor::open(dir.path()).unwrap();

        assert_eq!(cursor.begin(at(10)).unwrap(), Some(at(0)));
        assert_eq!(cursor.complete().unwrap(), at(10));

        let reopened = InvalidationCursor::open(dir.path()).unwrap();
        assert_eq!(reopened.state(), CursorState::Settled(at(10)));
    }

    #[test]
    fn aborted_sweep_keeps_the_old_value() {
        let dir = tempdir().unwrap();
        let mut cursor = InvalidationCursor::open(dir.path()).unwrap();
        cursor.begin(at(0)).unwrap();

        cursor.begin(at(10)).unwrap();
        cursor.abort();

        assert_eq!(cursor.state(), CursorState::Settled(at(0)));
        assert_eq!(stored(dir.path()), at(0).timestamp_millis().to_string());
        assert_eq!(cursor.begin(at(20)).unwrap(), Some(at(0)));
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let dir = tempdir().unwrap();
        let mut cursor = InvalidationCursor::open(dir.path()).unwrap();
        cursor.begin(at(30)).unwrap();

        cursor.begin(at(30) - Duration::minutes(5)).unwrap();
        assert_eq!(cursor.complete().unwrap(), at(30));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CURSOR_FILE_NAME), "yesterday").unwrap();
        assert!(matches!(
            InvalidationCursor::open(dir.path()),
            Err(CursorError::Corrupt { .. })
        ));
    }

    #[test]
    fn trailing_newline_is_accepted() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CURSOR_FILE_NAME), "1559390400000\n").unwrap();
        let cursor = InvalidationCursor::open(dir.path()).unwrap();
        assert_eq!(cursor.state(), CursorState::Settled(at(0)));
    }

    #[test]
    fn transitions_are_checked() {
        let dir = tempdir().unwrap();
        let mut cursor = InvalidationCursor::open(dir.path()).unwrap();
        assert!(matches!(
            cursor.complete(),
            Err(CursorError::InvalidTransition { state: "cold", .. })
        ));
        cursor.begin(at(0)).unwrap();
        cursor.begin(at(1)).unwrap();
        assert!(matches!(
            cursor.begin(at(2)),
            Err(CursorError::InvalidTransition { state: "running", .. })
        ));
    }
}
