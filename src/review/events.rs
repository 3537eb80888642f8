//! Unified, chronologically ordered pull request events.
//!
//! GitHub stores issue comments and formal reviews in separate lists that
//! paginate independently. Both carry free text that may contain commands,
//! so they are merged into one sequence sorted by creation time before the
//! approval state is folded.

use chrono::{DateTime, Utc};

use crate::effects::{CommentData, ReviewData};
use crate::types::{CommentId, Login};

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// An issue comment; only these can be the tracking comment.
    Comment(CommentId),
    /// A submitted pull request review.
    Review,
}

/// One comment or review, reduced to the fields the review engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub source: EventSource,
    pub author: Login,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentData> for Event {
    fn from(comment: CommentData) -> Self {
        Event {
            source: EventSource::Comment(comment.id),
            author: comment.author,
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

impl From<ReviewData> for Event {
    fn from(review: ReviewData) -> Self {
        Event {
            source: EventSource::Review,
            author: review.author,
            body: review.body,
            created_at: review.submitted_at,
        }
    }
}

/// Merges comments and reviews into one list ordered by creation time.
///
/// The sort is stable, so events with identical timestamps keep the order in
/// which they were returned (comments before reviews).
pub fn order_events(comments: Vec<CommentData>, reviews: Vec<ReviewData>) -> Vec<Event> {
    let mut events: Vec<Event> = comments
        .into_iter()
        .map(Event::from)
        .chain(reviews.into_iter().map(Event::from))
        .collect();
    events.sort_by_key(|event| event.created_at);
    events
}
