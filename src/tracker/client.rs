//! Jira REST API client.
//!
//! Only anonymous read access is needed: single issue lookups and a JQL
//! search for recently updated tickets.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::error::TrackerError;
use super::{TicketIssue, TicketTracker, TrackerConnector};
use crate::types::TicketId;

const SEARCH_PAGE_SIZE: usize = 100;

/// JQL compares dates in the server's time zone, which is unknown here.
/// Widening the window by a day makes sure no update is missed; evicting a
/// few extra entries only costs refetches.
const TIME_ZONE_SLACK: chrono::Duration = chrono::Duration::hours(24);

/// Anonymous Jira client bound to one project.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: Client,
    base_url: String,
    project: String,
}

impl JiraClient {
    pub fn new(
        base_url: impl Into<String>,
        project: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| TrackerError::Http {
                endpoint: base_url.clone(),
                source,
            })?;
        Ok(JiraClient {
            client,
            base_url,
            project: project.into(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/rest/api/2{}", self.base_url, path)
    }

    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> Result<T, TrackerError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|source| TrackerError::Http {
                endpoint: endpoint.to_string(),
                source,
            });
        }
        let message = match status {
            StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded".to_string(),
            _ => response.text().await.unwrap_or_default(),
        };
        Err(TrackerError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, TrackerError> {
        let response = self
            .client
            .get(self.api_url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|source| TrackerError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Self::handle_response(response, endpoint).await
    }

    /// The JQL selecting every project ticket updated since `since`.
    pub fn changed_since_jql(&self, since: DateTime<Utc>) -> String {
        let since = since - TIME_ZONE_SLACK;
        format!(
            "project = {} AND updatedDate >= \"{}\" ORDER BY updated ASC",
            self.project,
            since.format("%Y/%m/%d %H:%M")
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawAssignee {
    name: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(default)]
    components: Vec<RawComponent>,
    assignee: Option<RawAssignee>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    fields: RawFields,
}

impl From<RawIssue> for TicketIssue {
    fn from(issue: RawIssue) -> Self {
        TicketIssue {
            id: TicketId::new(issue.key),
            components: issue
                .fields
                .components
                .into_iter()
                .map(|component| component.name)
                .collect(),
            assignee: issue
                .fields
                .assignee
                .and_then(|assignee| assignee.name.or(assignee.display_name)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResult {
    total: usize,
    issues: Vec<RawSearchHit>,
}

#[derive(Debug, Deserialize)]
struct RawSearchHit {
    key: String,
}

impl TicketTracker for JiraClient {
    async fn get_issue(&self, id: &TicketId) -> Result<TicketIssue, TrackerError> {
        let endpoint = format!("/issue/{id}");
        let query = [("fields", "components,assignee".to_string())];
        match self.get::<RawIssue>(&endpoint, &query).await {
            Ok(issue) => Ok(issue.into()),
            Err(TrackerError::Status { status: 404, .. }) => Err(TrackerError::NotFound(id.clone())),
            Err(e) => Err(e),
        }
    }

    async fn search_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<TicketId>, TrackerError> {
        let jql = self.changed_since_jql(since);
        debug!(%jql, "searching for changed tickets");

        let mut found = Vec::new();
        loop {
            let query = [
                ("jql", jql.clone()),
                ("fields", "key".to_string()),
                ("startAt", found.len().to_string()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ];
            let page: RawSearchResult = self.get("/search", &query).await?;
            let empty_page = page.issues.is_empty();
            found.extend(page.issues.into_iter().map(|hit| TicketId::new(hit.key)));
            if empty_page || found.len() >= page.total {
                break;
            }
        }
        Ok(found)
    }
}

/// Builds fresh [`JiraClient`]s.
#[derive(Debug, Clone)]
pub struct JiraConnector {
    pub base_url: String,
    pub project: String,
    pub timeout: Duration,
}

impl TrackerConnector for JiraConnector {
    type Tracker = JiraClient;

    fn connect(&self) -> Result<JiraClient, TrackerError> {
        info!(url = %self.base_url, "creating new Jira REST client");
        JiraClient::new(self.base_url.clone(), self.project.clone(), self.timeout)
    }
}
