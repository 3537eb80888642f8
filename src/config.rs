//! Process configuration from environment variables.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `REVIEW_BOT_GITHUB_TOKEN` | token of the bot account | required |
//! | `REVIEW_BOT_REPO` | `owner/repo` | required |
//! | `REVIEW_BOT_NAME` | login of the bot account | `flinkbot` |
//! | `REVIEW_BOT_COMMITTERS` | comma-separated logins | empty |
//! | `REVIEW_BOT_PMC` | comma-separated logins | empty |
//! | `REVIEW_BOT_JIRA_URL` | ticket tracker base URL | `https://issues.apache.org/jira` |
//! | `REVIEW_BOT_JIRA_PROJECT` | ticket project key | `FLINK` |
//! | `REVIEW_BOT_DATA_DIR` | cache and cursor directory | `./data` |
//!
//! Loop periods are read by [`PollConfig`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::{InvalidRepoId, Login, RepoId};
use crate::worker::PollConfig;

const DEFAULT_BOT_NAME: &str = "flinkbot";
const DEFAULT_JIRA_URL: &str = "https://issues.apache.org/jira";
const DEFAULT_JIRA_PROJECT: &str = "FLINK";
const DEFAULT_DATA_DIR: &str = "./data";

/// Timeout of a single ticket tracker request.
pub const JIRA_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("invalid REVIEW_BOT_REPO")]
    InvalidRepo(#[from] InvalidRepoId),
}

#[derive(Clone)]
pub struct BotConfig {
    pub github_token: String,
    pub repo: RepoId,
    pub bot: Login,
    pub committers: Vec<Login>,
    pub pmc: Vec<Login>,
    pub jira_url: String,
    pub jira_project: String,
    pub data_dir: PathBuf,
    pub poll: PollConfig,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("github_token", &"<redacted>")
            .field("repo", &self.repo)
            .field("bot", &self.bot)
            .field("committers", &self.committers.len())
            .field("pmc", &self.pmc.len())
            .field("jira_url", &self.jira_url)
            .field("jira_project", &self.jira_project)
            .field("data_dir", &self.data_dir)
            .field("poll", &self.poll)
            .finish()
    }
}

fn logins(list: Option<String>) -> Vec<Login> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(Login::new)
        .collect()
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| present(name).ok_or(ConfigError::Missing(name));

        let github_token = required("REVIEW_BOT_GITHUB_TOKEN")?;
        let repo = RepoId::parse(required("REVIEW_BOT_REPO")?.trim())?;

        Ok(BotConfig {
            github_token,
            repo,
            bot: Login::new(present("REVIEW_BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string())),
            committers: logins(present("REVIEW_BOT_COMMITTERS")),
            pmc: logins(present("REVIEW_BOT_PMC")),
            jira_url: present("REVIEW_BOT_JIRA_URL").unwrap_or_else(|| DEFAULT_JIRA_URL.to_string()),
            jira_project: present("REVIEW_BOT_JIRA_PROJECT")
                .unwrap_or_else(|| DEFAULT_JIRA_PROJECT.to_string()),
            data_dir: present("REVIEW_BOT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            poll: PollConfig::from_lookup(&lookup),
        })
    }
}
