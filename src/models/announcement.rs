//! Announcement data structures.

use serde::{Deserialize, Serialize};

/// Placeholder stored when the publication date cannot be extracted.
///
/// The rest of the record stays usable; the sentinel participates in
/// identity comparison like any other date value.
pub const UNKNOWN_DATE: &str = "unknown date";

/// One announcement extracted from the news page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Announcement title
    pub title: String,

    /// Publication date, free-form text ([`UNKNOWN_DATE`] if not found)
    pub date: String,

    /// Body paragraphs joined with newlines (empty if none found)
    pub body: String,
}

impl Announcement {
    /// The subset of fields used to decide whether two announcements
    /// are the same item. Body text is deliberately excluded: it is the
    /// least stable field and must not cause false "new" detections.
    pub fn identity(&self) -> Identity {
        Identity {
            title: self.title.trim().to_string(),
            date: self.date.trim().to_string(),
        }
    }
}

/// The (title, date) pair identifying the last notified announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub title: String,
    pub date: String,
}

impl Identity {
    /// Identity representing "no prior announcement known".
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no prior announcement is recorded.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.date.is_empty()
    }
}
