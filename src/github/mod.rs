//! GitHub API client and effect interpreter.
//!
//! `OctocrabClient` implements `GitHubInterpreter`, executing effects against
//! the REST API and classifying failures into `GitHubErrorKind`s.

mod client;
mod error;
mod interpreter;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
