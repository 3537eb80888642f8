//! Periods of the background loops.
//!
//! | loop | variable | default |
//! |---|---|---|
//! | new pull request scan | `REVIEW_BOT_NEW_PR_INTERVAL_SECS` | 5 minutes |
//! | mention processing | `REVIEW_BOT_NOTIFICATION_INTERVAL_SECS` | 30 seconds |
//! | component labeler | `REVIEW_BOT_LABELER_INTERVAL_SECS` | 1 hour |
//! | cache invalidation | `REVIEW_BOT_INVALIDATION_INTERVAL_SECS` | 6 hours |

use std::time::Duration;

use tracing::warn;

const DEFAULT_NEW_PR_INTERVAL_SECS: u64 = 300;
const DEFAULT_NOTIFICATION_INTERVAL_SECS: u64 = 30;
const DEFAULT_LABELER_INTERVAL_SECS: u64 = 3600;
const DEFAULT_INVALIDATION_INTERVAL_SECS: u64 = 6 * 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub new_pr_interval: Duration,
    pub notification_interval: Duration,
    pub labeler_interval: Duration,
    pub invalidation_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    pub fn new() -> Self {
        PollConfig {
            new_pr_interval: Duration::from_secs(DEFAULT_NEW_PR_INTERVAL_SECS),
            notification_interval: Duration::from_secs(DEFAULT_NOTIFICATION_INTERVAL_SECS),
            labeler_interval: Duration::from_secs(DEFAULT_LABELER_INTERVAL_SECS),
            invalidation_interval: Duration::from_secs(DEFAULT_INVALIDATION_INTERVAL_SECS),
        }
    }

    /// Reads the periods from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the periods through `lookup`.
    ///
    /// Unset variables use the default. Values that are not a positive
    /// number of seconds are logged and replaced by the default as well.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |name: &str, default: u64| {
            let secs = match lookup(name) {
                None => default,
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        warn!(variable = name, value = %raw, default, "ignoring invalid interval");
                        default
                    }
                },
            };
            Duration::from_secs(secs)
        };

        PollConfig {
            new_pr_interval: secs("REVIEW_BOT_NEW_PR_INTERVAL_SECS", DEFAULT_NEW_PR_INTERVAL_SECS),
            notification_interval: secs(
                "REVIEW_BOT_NOTIFICATION_INTERVAL_SECS",
                DEFAULT_NOTIFICATION_INTERVAL_SECS,
            ),
            labeler_interval: secs("REVIEW_BOT_LABELER_INTERVAL_SECS", DEFAULT_LABELER_INTERVAL_SECS),
            invalidation_interval: secs(
                "REVIEW_BOT_INVALIDATION_INTERVAL_SECS",
                DEFAULT_INVALIDATION_INTERVAL_SECS,
            ),
        }
    }
}
