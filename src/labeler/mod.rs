//! Component labels mirrored from the ticket tracker.
//!
//! A pull request whose title references a ticket gets one
//! `component=<Name>` label per ticket component (spaces removed), or
//! `component=<none>` when the ticket has none. Other labels are left alone.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::cache::PrLabelCache;
use crate::effects::{EffectError, EffectExecutor, GitHubInterpreter, PrListState, PrSummary};
use crate::tracker::{CachedComponents, TicketTracker, TrackerError};
use crate::types::TicketId;

pub const COMPONENT_PREFIX: &str = "component=";

pub const COMPONENT_LABEL_COLOR: &str = "175fb7";

#[derive(Debug, Error)]
pub enum LabelerError {
    #[error(transparent)]
    GitHub(#[from] EffectError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// The labels a ticket's components map to.
pub fn component_labels(components: &[String]) -> Vec<String> {
    if components.is_empty() {
        return vec![format!("{COMPONENT_PREFIX}<none>")];
    }
    let mut labels: Vec<String> = Vec::with_capacity(components.len());
    for component in components {
        let label = format!("{COMPONENT_PREFIX}{}", component.replace(' ', ""));
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentChanges {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl ComponentChanges {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

pub fn plan_component_labels(current: &[String], required: &[String]) -> ComponentChanges {
    ComponentChanges {
        add: required
            .iter()
            .filter(|label| !current.contains(label))
            .cloned()
            .collect(),
        remove: current
            .iter()
            .filter(|label| label.starts_with(COMPONENT_PREFIX) && !required.contains(label))
            .cloned()
            .collect(),
    }
}

/// Counters for one labeler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelerPass {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct ComponentLabeler<G, T> {
    github: Arc<EffectExecutor<G>>,
    components: CachedComponents<T>,
    labels: PrLabelCache,
    project: String,
}

impl<G: GitHubInterpreter, T: TicketTracker> ComponentLabeler<G, T> {
    pub fn new(
        github: Arc<EffectExecutor<G>>,
        components: CachedComponents<T>,
        labels: PrLabelCache,
        project: impl Into<String>,
    ) -> Self {
        ComponentLabeler {
            github,
            components,
            labels,
            project: project.into(),
        }
    }

    /// Labels every pull request of the repository, open or closed.
    ///
    /// A failing pull request is logged and skipped. Shutdown while waiting
    /// on the tracker ends the pass.
    #[instrument(skip(self))]
    pub async fn run_pass(&self) -> Result<LabelerPass, LabelerError> {
        let pulls = self.github.list_pull_requests(PrListState::All).await?;
        info!(count = pulls.len(), "checking component labels");

        let mut pass = LabelerPass::default();
        for pull in &pulls {
            pass.checked += 1;
            match self.label_pull_request(pull).await {
                Ok(changes) if !changes.is_empty() => pass.updated += 1,
                Ok(_) => {}
                Err(LabelerError::Tracker(TrackerError::Cancelled)) => {
                    return Err(TrackerError::Cancelled.into());
                }
                Err(e) => {
                    pass.failed += 1;
                    warn!(pr = %pull.number, error = %e, "failed to update component labels");
                }
            }
        }
        Ok(pass)
    }

    pub async fn label_pull_request(&self, pull: &PrSummary) -> Result<ComponentChanges, LabelerError> {
        let Some(ticket) = TicketId::find_in(&pull.title, &self.project) else {
            debug!(pr = %pull.number, "no ticket referenced in title");
            return Ok(ComponentChanges::default());
        };

        let components = self.components.components(&ticket).await?;
        let required = component_labels(&components);
        let current = self
            .labels
            .labels(&self.github, pull.number, pull.updated_at)
            .await?;
        let changes = plan_component_labels(&current, &required);
        if changes.is_empty() {
            return Ok(changes);
        }

        for label in &changes.add {
            self.github
                .get_or_create_label(label, COMPONENT_LABEL_COLOR)
                .await?;
        }
        if !changes.add.is_empty() {
            self.github
                .add_labels(pull.number, changes.add.clone())
                .await?;
        }
        for label in &changes.remove {
            self.github.remove_label(pull.number, label.clone()).await?;
        }
        info!(
            pr = %pull.number,
            %ticket,
            added = ?changes.add,
            removed = ?changes.remove,
            "updated component labels"
        );
        Ok(changes)
    }
}
