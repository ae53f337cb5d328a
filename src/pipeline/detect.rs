// src/pipeline/detect.rs

//! Change detection between the fresh announcement and the stored identity.

use crate::models::Identity;

/// Decide whether the current announcement is new relative to the stored
/// identity.
///
/// Pure function. Equality is exact (case-sensitive, whitespace-trimmed)
/// on both title and date. An empty stored identity means first run, which
/// always counts as new. A field that degraded to a sentinel still takes
/// part in the comparison, so degradation can trigger a notification but
/// never suppress one.
pub fn is_new(current: &Identity, stored: &Identity) -> bool {
    if stored.is_empty() {
        return true;
    }
    current.title.trim() != stored.title.trim() || current.date.trim() != stored.date.trim()
}
