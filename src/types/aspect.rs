//! The reviewable aspects of a pull request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One reviewable dimension of a pull request.
///
/// The declaration order is the canonical review order: it drives label
/// escalation and the expansion of `approve-until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAspect {
    Description,
    Consensus,
    Architecture,
    Quality,
}

impl ReviewAspect {
    /// All aspects in canonical order.
    pub const ALL: [ReviewAspect; 4] = [
        ReviewAspect::Description,
        ReviewAspect::Consensus,
        ReviewAspect::Architecture,
        ReviewAspect::Quality,
    ];

    /// The keyword used in commands and template placeholders.
    pub fn name(self) -> &'static str {
        match self {
            ReviewAspect::Description => "description",
            ReviewAspect::Consensus => "consensus",
            ReviewAspect::Architecture => "architecture",
            ReviewAspect::Quality => "quality",
        }
    }

    /// Parses an aspect keyword, ignoring ASCII case.
    pub fn parse(word: &str) -> Option<ReviewAspect> {
        Self::ALL
            .into_iter()
            .find(|aspect| aspect.name().eq_ignore_ascii_case(word))
    }

    /// The bracketed placeholder marking this aspect's line in the template.
    pub fn placeholder(self) -> String {
        format!("[{}]", self.name())
    }

    /// Every aspect from the first in canonical order up to and including `self`.
    pub fn through(self) -> impl Iterator<Item = ReviewAspect> {
        Self::ALL.into_iter().filter(move |aspect| *aspect <= self)
    }
}

impl fmt::Display for ReviewAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ReviewAspect::parse("Consensus"), Some(ReviewAspect::Consensus));
        assert_eq!(ReviewAspect::parse("QUALITY"), Some(ReviewAspect::Quality));
        assert_eq!(ReviewAspect::parse("all"), None);
        assert_eq!(ReviewAspect::parse(""), None);
    }

    #[test]
    fn canonical_order_matches_declaration() {
        let mut sorted = ReviewAspect::ALL;
        sorted.sort();
        assert_eq!(sorted, ReviewAspect::ALL);
    }

    #[test]
    fn through_architecture_stops_before_quality() {
        let aspects: Vec<_> = ReviewAspect::Architecture.through().collect();
        assert_eq!(
            aspects,
            vec![
                ReviewAspect::Description,
                ReviewAspect::Consensus,
                ReviewAspect::Architecture
            ]
        );
    }

    #[test]
    fn through_first_is_singleton() {
        let aspects: Vec<_> = ReviewAspect::Description.through().collect();
        assert_eq!(aspects, vec![ReviewAspect::Description]);
    }
}
