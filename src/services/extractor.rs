// src/services/extractor.rs

//! Announcement extraction from the fetched news page.
//!
//! The page markup is externally controlled and has changed several times,
//! so extraction is driven by an ordered list of [`MarkupProfile`]s. Within
//! the first container that carries a title, the title is required while
//! date and body degrade to placeholders when their lookups find nothing.
//! Only the total absence of a usable container is a hard failure.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::config::MarkupProfile;
use crate::error::{AppError, Result};
use crate::models::{Announcement, UNKNOWN_DATE};
use crate::utils::text::normalize_whitespace;

/// Extract the most recent announcement from raw page markup.
///
/// Profiles are tried in order; within a profile, containers are scanned in
/// document order and the first one with a non-empty title wins. Returns
/// [`AppError::NoContainer`] when no profile yields a titled container.
pub fn extract(markup: &str, profiles: &[MarkupProfile]) -> Result<Announcement> {
    let document = Html::parse_document(markup);

    for profile in profiles {
        match extract_with_profile(&document, profile) {
            Ok(Some(announcement)) => {
                log::debug!("Extracted announcement using profile '{}'", profile.name);
                return Ok(announcement);
            }
            Ok(None) => continue,
            Err(error) => {
                // A broken selector disables one profile, not the extractor.
                log::warn!("Markup profile '{}' unusable: {}", profile.name, error);
                continue;
            }
        }
    }

    Err(AppError::NoContainer)
}

fn extract_with_profile(document: &Html, profile: &MarkupProfile) -> Result<Option<Announcement>> {
    let container_sel = parse_selector(&profile.container_selector)?;
    let title_sel = parse_selector(&profile.title_selector)?;
    let date_sel = parse_selector(&profile.date_selector)?;
    let body_sel = parse_selector(&profile.body_selector)?;

    for container in document.select(&container_sel) {
        let Some(title_elem) = container
            .select(&title_sel)
            .find(|el| !element_text(el).is_empty())
        else {
            continue;
        };
        let title = element_text(&title_elem);

        let window = announcement_window(container, &title_sel, title_elem);

        // The window bounds the date lookup so a whole-page container does
        // not borrow the next announcement's date. A date rendered above
        // the title falls before the window, hence the second pass over the
        // pre-title region.
        let date_elem = container
            .select(&date_sel)
            .find(|el| window.within.contains(&el.id()) && !element_text(el).is_empty())
            .or_else(|| {
                container
                    .select(&date_sel)
                    .find(|el| window.before.contains(&el.id()) && !element_text(el).is_empty())
            });
        // The date stays free-form: it is compared and persisted verbatim,
        // never parsed as a calendar date.
        let date = date_elem
            .map(|el| element_text(&el))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string());

        let body = container
            .select(&body_sel)
            .filter(|el| window.within.contains(&el.id()))
            .filter(|el| !holds_date(date_elem, el.id()))
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        return Ok(Some(Announcement { title, date, body }));
    }

    Ok(None)
}

/// One announcement's slice of a container, as node id sets.
struct AnnouncementWindow {
    /// Nodes preceding the title element in document order
    before: HashSet<NodeId>,
    /// Nodes between the title element and the next title match
    within: HashSet<NodeId>,
}

/// Split the container subtree around the title element.
///
/// A single pass in document order: everything before the title goes into
/// `before`, everything after it into `within` until the next title match
/// (the next announcement's boundary). Nodes inside the title element
/// itself belong to neither set.
fn announcement_window(
    container: ElementRef<'_>,
    title_sel: &Selector,
    title_elem: ElementRef<'_>,
) -> AnnouncementWindow {
    let title_ids: HashSet<NodeId> = container.select(title_sel).map(|el| el.id()).collect();

    let mut before = HashSet::new();
    let mut within = HashSet::new();
    let mut past_title = false;

    for node in container.descendants() {
        let id = node.id();
        if id == title_elem.id() {
            past_title = true;
            continue;
        }
        if node.ancestors().any(|a| a.id() == title_elem.id()) {
            continue;
        }
        if !past_title {
            before.insert(id);
            continue;
        }
        if title_ids.contains(&id) {
            // Next announcement boundary
            break;
        }
        within.insert(id);
    }

    AnnouncementWindow { before, within }
}

/// True when the date element sits inside (or is) the given block.
fn holds_date(date_elem: Option<ElementRef<'_>>, block_id: NodeId) -> bool {
    let Some(date_elem) = date_elem else {
        return false;
    };
    date_elem.id() == block_id || date_elem.ancestors().any(|a| a.id() == block_id)
}

/// Collect and whitespace-normalize the text content of an element.
fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
