// src/utils/text.rs

//! Text normalization and truncation helpers.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse all runs of whitespace to single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count text units (grapheme clusters) in a string.
pub fn unit_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Truncate a string to at most `limit` text units.
///
/// Truncation happens on grapheme boundaries so a multi-codepoint
/// character is never split.
pub fn truncate_units(s: &str, limit: usize) -> String {
    s.graphemes(true).take(limit).collect()
}
