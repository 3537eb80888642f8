//! The effect interpreter trait.
//!
//! Review logic describes what it needs from GitHub as `GitHubEffect` values
//! and hands them to an interpreter. The production interpreter talks to the
//! REST API; tests substitute `test_utils::FakeGitHub`, which serves canned
//! state and records every effect it receives.

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};
use crate::github::GitHubApiError;

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId`, so all effects executed
/// through a single interpreter instance are scoped to that repository.
///
/// Failures are reported as `GitHubApiError` so callers can tell transient
/// failures and absent resources apart regardless of the implementation.
pub trait GitHubInterpreter: Send + Sync {
    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, GitHubApiError>> + Send;
}
