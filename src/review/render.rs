//! Rendering the tracking comment.
//!
//! Rendering is a pure function of the template, the filtered approval state,
//! the role rosters and the warnings block. The engine compares the result
//! with the existing body byte for byte and only issues an update when they
//! differ, so re-rendering an unchanged thread never touches GitHub.

use chrono::{DateTime, Utc};

use super::roles::Roles;
use super::template::{
    APPROVED_GLYPH, ATTENTION_GLYPH, ATTENTION_PLACEHOLDER, CHECK_MARKER, PENDING_GLYPH,
    REVIEW_PROGRESS_HEADING, TrackingTemplate,
};
use crate::types::{ApprovalState, Login, ReviewAspect, Sha};

/// The "Automated Checks" section, from the check marker line up to (not
/// including) the review progress heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningsBlock {
    lines: Vec<String>,
}

impl WarningsBlock {
    /// The block of a freshly posted comment, before any check ran.
    pub fn pending() -> Self {
        WarningsBlock {
            lines: vec![format!("{CHECK_MARKER} (pending)"), String::new()],
        }
    }

    /// A block listing the warnings produced for `sha`.
    pub fn generate(sha: &Sha, checked_at: DateTime<Utc>, warnings: &[String]) -> Self {
        let mut lines = vec![
            format!("{CHECK_MARKER} {sha} ({})", checked_at.to_rfc2822()),
            String::new(),
        ];
        if warnings.is_empty() {
            lines.push(" ✅no warnings".to_string());
        } else {
            lines.push("**Warnings:**".to_string());
            lines.extend(warnings.iter().map(|warning| format!(" * {warning}")));
        }
        lines.push(String::new());
        WarningsBlock { lines }
    }

    /// Finds the block in an existing tracking comment.
    pub fn extract(body: &str) -> Option<Self> {
        let mut lines = body.lines().skip_while(|line| !line.starts_with(CHECK_MARKER));
        let first = lines.next()?;
        let mut block = vec![first.to_string()];
        block.extend(
            lines
                .take_while(|line| *line != REVIEW_PROGRESS_HEADING)
                .map(str::to_string),
        );
        Some(WarningsBlock { lines: block })
    }

    /// The commit the block was generated for, if it names a valid one.
    pub fn checked_sha(&self) -> Option<Sha> {
        let marker_line = self.lines.first()?;
        let rest = marker_line.strip_prefix(CHECK_MARKER)?;
        let token = rest.split_whitespace().next()?;
        Sha::parse(token).ok()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// The existing warnings block, if it is still current for `head_sha`.
///
/// `None` means the checks have to run again: the comment has no block, the
/// block was never filled in, or the pull request got new commits.
pub fn reusable_warnings(existing_body: &str, head_sha: &Sha) -> Option<WarningsBlock> {
    WarningsBlock::extract(existing_body).filter(|block| block.checked_sha().as_ref() == Some(head_sha))
}

fn annotated_list<'a>(logins: impl Iterator<Item = &'a Login>, roles: &Roles) -> String {
    logins
        .map(|login| roles.annotate(login))
        .collect::<Vec<_>>()
        .join(", ")
}

fn aspect_on_line(line: &str) -> Option<ReviewAspect> {
    ReviewAspect::ALL
        .into_iter()
        .find(|aspect| line.contains(&aspect.placeholder()))
}

/// Renders the tracking comment body.
///
/// Aspect lines with at least one approver are followed by the sorted
/// approver list. A line is only ticked once it and every earlier aspect have
/// approvers, so the ticks never run ahead of the review label. The attention line gets its own glyph. The template's
/// warnings block is replaced by `warnings`.
pub fn render(
    template: &TrackingTemplate,
    state: &ApprovalState,
    roles: &Roles,
    warnings: WarningsBlock,
) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut warnings = Some(warnings);
    let mut skipping_template_block = false;

    for line in template.lines() {
        if skipping_template_block {
            if line != REVIEW_PROGRESS_HEADING {
                continue;
            }
            skipping_template_block = false;
        }

        if line.starts_with(CHECK_MARKER) {
            if let Some(block) = warnings.take() {
                out.extend(block.into_lines());
            }
            skipping_template_block = true;
            continue;
        }

        if let Some(aspect) = aspect_on_line(line) {
            if state.has_approval(aspect) {
                if aspect.through().all(|earlier| state.has_approval(earlier)) {
                    out.push(line.replacen(PENDING_GLYPH, APPROVED_GLYPH, 1));
                } else {
                    out.push(line.to_string());
                }
                out.push(format!(
                    "    - Approved by {}",
                    annotated_list(state.approvers(aspect), roles)
                ));
                continue;
            }
        } else if line.contains(ATTENTION_PLACEHOLDER) && state.has_attention() {
            out.push(line.replacen(PENDING_GLYPH, ATTENTION_GLYPH, 1));
            out.push(format!(
                "    - Needs attention by {}",
                annotated_list(state.attention(), roles)
            ));
            continue;
        }

        out.push(line.to_string());
    }

    out.join("\n")
}
