//! The review-stage label.
//!
//! Each pull request carries exactly one `review=` label naming the first
//! aspect that still lacks an approval, or `review=approved ✅` once every
//! aspect is approved.

use tracing::{info, warn};

use crate::effects::{EffectError, EffectExecutor, GitHubInterpreter};
use crate::types::{ApprovalState, PrNumber, ReviewAspect};

/// Prefix reserved for labels managed by the review engine.
pub const REVIEW_LABEL_PREFIX: &str = "review=";

pub const REVIEW_LABEL_COLOR: &str = "bcf5db";

pub const APPROVED_LABEL: &str = "review=approved ✅";

/// The label for a pull request waiting on `aspect`.
pub fn stage_label(aspect: ReviewAspect) -> String {
    format!("{REVIEW_LABEL_PREFIX}{aspect}?")
}

/// The label the approval state calls for.
///
/// Escalation stops at the first aspect without approvers; approvals of later
/// aspects do not count until every earlier one is approved.
pub fn canonical_label(state: &ApprovalState) -> String {
    ReviewAspect::ALL
        .into_iter()
        .find(|aspect| !state.has_approval(*aspect))
        .map(stage_label)
        .unwrap_or_else(|| APPROVED_LABEL.to_string())
}

/// Label changes that bring a pull request to the canonical label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPlan {
    pub remove: Vec<String>,
    pub add: Option<String>,
}

impl LabelPlan {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_none()
    }
}

/// Diffs the current labels against the canonical one.
///
/// Reserved labels other than the canonical one are removed, which also
/// repairs pull requests that somehow ended up with several of them. The
/// canonical label is added unless it is already present. Unrelated labels are
/// never touched.
pub fn plan_label_changes(current: &[String], canonical: &str) -> LabelPlan {
    let reserved: Vec<&String> = current
        .iter()
        .filter(|label| label.starts_with(REVIEW_LABEL_PREFIX))
        .collect();
    let has_canonical = reserved.iter().any(|label| label.as_str() == canonical);

    LabelPlan {
        remove: reserved
            .into_iter()
            .filter(|label| label.as_str() != canonical)
            .cloned()
            .collect(),
        add: (!has_canonical).then(|| canonical.to_string()),
    }
}

/// Brings the pull request's review label in line with `state`.
pub async fn reconcile_review_label<G: GitHubInterpreter>(
    github: &EffectExecutor<G>,
    pr: PrNumber,
    state: &ApprovalState,
) -> Result<LabelPlan, EffectError> {
    let canonical = canonical_label(state);
    let current = github.get_labels(pr).await?;
    let plan = plan_label_changes(&current, &canonical);

    let reserved = current
        .iter()
        .filter(|label| label.starts_with(REVIEW_LABEL_PREFIX))
        .count();
    if reserved > 1 {
        warn!(%pr, labels = ?plan.remove, "detected multiple review labels, removing extras");
    }
    for label in &plan.remove {
        github.remove_label(pr, label.clone()).await?;
    }
    if let Some(label) = &plan.add {
        github.get_or_create_label(label, REVIEW_LABEL_COLOR).await?;
        github.add_labels(pr, vec![label.clone()]).await?;
        info!(%pr, removed = ?plan.remove, added = %label, "updated review label");
    }

    Ok(plan)
}
