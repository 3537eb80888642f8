//! The tracking comment template.
//!
//! Every tracking comment starts as a copy of this template. Later renders
//! walk the template line by line again, so the template (not the existing
//! comment) decides the layout; only the warnings block is carried over from
//! the existing comment.

use crate::types::{Login, ReviewAspect};

/// Number of leading characters compared to recognize a tracking comment.
pub const IDENTIFYING_PREFIX_CHARS: usize = 70;

/// First line of the warnings block; followed by the checked SHA.
pub const CHECK_MARKER: &str = "Last check on commit";

/// Heading that ends the warnings block.
pub const REVIEW_PROGRESS_HEADING: &str = "## Review Progress";

pub const ATTENTION_PLACEHOLDER: &str = "[attention]";

pub const PENDING_GLYPH: &str = "❓";
pub const APPROVED_GLYPH: &str = "✅";
pub const ATTENTION_GLYPH: &str = "❗";

/// The tracking comment template for one bot identity.
#[derive(Debug, Clone)]
pub struct TrackingTemplate {
    bot: Login,
    body: String,
}

impl TrackingTemplate {
    pub fn new(bot: Login) -> Self {
        let body = build_body(&bot);
        TrackingTemplate { bot, body }
    }

    pub fn bot(&self) -> &Login {
        &self.bot
    }

    /// The body posted on a pull request that has no tracking comment yet.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.body.lines()
    }

    /// Whether a comment is this bot's tracking comment.
    ///
    /// Both the author and the leading characters must match; other users
    /// quoting the template do not count.
    pub fn is_tracking_comment(&self, author: &Login, body: &str) -> bool {
        author.folded() == self.bot.folded()
            && body
                .chars()
                .take(IDENTIFYING_PREFIX_CHARS)
                .eq(self.body.chars().take(IDENTIFYING_PREFIX_CHARS))
    }
}

fn build_body(bot: &Login) -> String {
    let aspect = |aspect: ReviewAspect| aspect.placeholder();
    let mut lines = vec![
        format!(
            "Thanks a lot for your contribution to the Apache Flink project. I'm the {bot}. I help the community"
        ),
        "to review your pull request. We will use this comment to track the progress of the review.".to_string(),
        String::new(),
        String::new(),
        "## Automated Checks".to_string(),
    ];
    lines.extend(super::render::WarningsBlock::pending().into_lines());
    lines.extend([
        REVIEW_PROGRESS_HEADING.to_string(),
        String::new(),
        format!(
            "* {PENDING_GLYPH} 1. The {} looks good.",
            aspect(ReviewAspect::Description)
        ),
        format!(
            "* {PENDING_GLYPH} 2. There is {} that the contribution should go into to Flink.",
            aspect(ReviewAspect::Consensus)
        ),
        format!("* {PENDING_GLYPH} 3. Needs {ATTENTION_PLACEHOLDER} from."),
        format!(
            "* {PENDING_GLYPH} 4. The change fits into the overall {}.",
            aspect(ReviewAspect::Architecture)
        ),
        format!(
            "* {PENDING_GLYPH} 5. Overall code {} is good.",
            aspect(ReviewAspect::Quality)
        ),
        String::new(),
        "Please see the [Pull Request Review Guide](https://flink.apache.org/contributing/reviewing-prs.html) for a full explanation of the review process.".to_string(),
        String::new(),
        "<details>".to_string(),
        " The Bot is tracking the review progress through labels. Labels are applied according to the order of the review items. For consensus, approval by a Flink committer or PMC member is required.".to_string(),
        " <summary>Bot commands</summary>".to_string(),
        format!("  The {bot} bot supports the following commands:"),
        String::new(),
        format!(
            " - `{bot} approve description` to approve one or more aspects (aspects: `description`, `consensus`, `architecture` and `quality`)"
        ),
        format!(" - `{bot} approve all` to approve all aspects"),
        format!(" - `{bot} approve-until architecture` to approve everything until `architecture`"),
        format!(" - `{bot} attention @username1 [@username2 ..]` to require somebody's attention"),
        format!(" - `{bot} disapprove architecture` to remove an approval you gave earlier"),
        "</details>".to_string(),
    ]);
    lines.join("\n")
}
