use soulbrowser_browser_driver::{BrowserDriver, ElementHandle};
use soulbrowser_core_types::Action;

use crate::errors::DiscoveryError;
use crate::types::Intent;

/// Tag/type combinations rejected for `fill` actions (§4.4
/// "Action-aware filtering").
const FILL_REJECTED_TAGS: &[&str] = &["select", "button"];
const FILL_REJECTED_INPUT_TYPES: &[&str] = &[
    "range", "color", "file", "checkbox", "radio", "button", "submit", "reset", "image",
];

async fn action_rejects(
    driver: &dyn BrowserDriver,
    handle: &ElementHandle,
    action: Action,
) -> Result<bool, DiscoveryError> {
    if !action.is_fill_like() {
        return Ok(false);
    }
    let tag = driver.tag_name(handle).await?;
    if FILL_REJECTED_TAGS.contains(&tag.as_str()) {
        return Ok(true);
    }
    if tag == "input" {
        if let Some(input_type) = driver.attribute(handle, "type").await? {
            if FILL_REJECTED_INPUT_TYPES.contains(&input_type.as_str()) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Outcome of narrowing a tier's raw matches down to a final choice.
pub enum Finalized {
    One(ElementHandle),
    None,
    /// More than one candidate survived filtering; only tier 6 acts on
    /// this directly, other tiers treat it as a tier miss.
    Many(Vec<ElementHandle>),
}

/// Apply container scoping, action-aware filtering, and ordinal
/// selection, in that order (§4.4). `candidates` must already be in
/// document order.
pub async fn finalize(
    driver: &dyn BrowserDriver,
    candidates: Vec<ElementHandle>,
    intent: &Intent,
    container: Option<&ElementHandle>,
) -> Result<Finalized, DiscoveryError> {
    let mut scoped = Vec::with_capacity(candidates.len());
    for handle in candidates {
        if let Some(container) = container {
            if !driver.is_descendant_of(&handle, container).await? {
                continue;
            }
        }
        if action_rejects(driver, &handle, intent.action).await? {
            continue;
        }
        scoped.push(handle);
    }

    if let Some(ordinal) = intent.ordinal {
        return Ok(match scoped.into_iter().nth(ordinal as usize) {
            Some(handle) => Finalized::One(handle),
            None => Finalized::None,
        });
    }

    match scoped.len() {
        0 => Ok(Finalized::None),
        1 => Ok(Finalized::One(scoped.into_iter().next().unwrap())),
        _ => Ok(Finalized::Many(scoped)),
    }
}
