use regex::Regex;
use soulbrowser_browser_driver::{BrowserDriver, ElementHandle};

use crate::errors::ExecutorError;

fn search_pattern() -> Regex {
    Regex::new("(?i)search|jump to").expect("static regex is valid")
}

/// Ordered candidate list for re-targeting after the activator click
/// (§4.6 "fill"): `role=searchbox`, placeholder matching
/// `search|jump to`, `input[type=search]`, `input[name=q]`, aria-label
/// matching `search`.
async fn find_visible_search_target(
    driver: &dyn BrowserDriver,
) -> Result<Option<ElementHandle>, ExecutorError> {
    let pattern = search_pattern();
    if let Some(handle) = driver.query("role=searchbox").await? {
        if driver.is_visible(&handle).await? {
            return Ok(Some(handle));
        }
    }

    for handle in driver.query_all("[placeholder]").await? {
        if let Some(placeholder) = driver.attribute(&handle, "placeholder").await? {
            if pattern.is_match(&placeholder) && driver.is_visible(&handle).await? {
                return Ok(Some(handle));
            }
        }
    }

    if let Some(handle) = driver.query("input[type=\"search\"]").await? {
        if driver.is_visible(&handle).await? {
            return Ok(Some(handle));
        }
    }

    if let Some(handle) = driver.query("input[name=\"q\"]").await? {
        if driver.is_visible(&handle).await? {
            return Ok(Some(handle));
        }
    }

    for handle in driver.query_all("[aria-label]").await? {
        if let Some(label) = driver.attribute(&handle, "aria-label").await? {
            if pattern.is_match(&label) && driver.is_visible(&handle).await? {
                return Ok(Some(handle));
            }
        }
    }

    Ok(None)
}

/// Whether `handle` looks like a hidden-input activator (§4.6: "a
/// button/icon that commonly reveals a hidden input"): either outright
/// invisible, or a non-input trigger element.
async fn needs_activation(
    driver: &dyn BrowserDriver,
    handle: &ElementHandle,
) -> Result<bool, ExecutorError> {
    if !driver.is_visible(handle).await? {
        return Ok(true);
    }
    let tag = driver.tag_name(handle).await?;
    Ok(tag != "input" && tag != "textarea")
}

/// Fill with the activator heuristic (§4.6 "fill"): when the resolved
/// element is hidden or looks like a search-reveal trigger rather than
/// an editable field, click it and re-target a visible input via the
/// ordered candidate list, falling back to the `/` hotkey.
pub async fn fill_with_activator(
    driver: &dyn BrowserDriver,
    handle: &ElementHandle,
    value: &str,
    timeout_ms: u64,
) -> Result<(), ExecutorError> {
    if !needs_activation(driver, handle).await? {
        driver.fill(handle, value, timeout_ms).await?;
        return Ok(());
    }

    driver.click(handle, timeout_ms).await?;
    if let Some(target) = find_visible_search_target(driver).await? {
        driver.fill(&target, value, timeout_ms).await?;
        return Ok(());
    }

    driver.press_key("/").await?;
    if let Some(target) = find_visible_search_target(driver).await? {
        driver.fill(&target, value, timeout_ms).await?;
        return Ok(());
    }

    Err(ExecutorError::NoFillTarget)
}
