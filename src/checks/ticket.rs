use super::{CheckContext, PullRequestCheck};

/// Requires a ticket reference in the title (except for hotfixes) and warns
/// when the referenced ticket has no assignee.
#[derive(Debug, Clone)]
pub struct AssignedTicketCheck {
    browse_url: String,
}

impl AssignedTicketCheck {
    pub fn new(tracker_url: &str) -> Self {
        AssignedTicketCheck {
            browse_url: format!("{}/browse", tracker_url.trim_end_matches('/')),
        }
    }
}

impl PullRequestCheck for AssignedTicketCheck {
    fn run_check(&self, ctx: &CheckContext) -> Option<String> {
        let Some(id) = &ctx.ticket_id else {
            if ctx.title.contains("hotfix") {
                return None;
            }
            return Some("**Invalid pull request title: No valid Jira ID provided**".to_string());
        };

        // An unreachable tracker is not the contributor's fault.
        let ticket = ctx.ticket.as_ref()?;
        if ticket.assignee.is_some() {
            return None;
        }
        Some(format!(
            "**This pull request references an unassigned [Jira ticket]({}/{id}).** \
             According to the [code contribution guide](https://flink.apache.org/contributing/contribute-code.html), \
             tickets need to be assigned before starting with the implementation work.",
            self.browse_url
        ))
    }
}
