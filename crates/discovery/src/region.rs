use soulbrowser_browser_driver::{BrowserDriver, ElementHandle};
use tracing::warn;

/// Resolve a region name to a scoping container, trying (in order):
/// named dialog → first visible dialog → edit-form container → main
/// landmark → whole page (§4.4 "Region scoping"). Returns `None` for
/// the container when scope is the whole page, alongside a warning
/// string when a named region was requested but nothing in the ladder
/// matched it (B4).
pub async fn resolve_region(
    driver: &dyn BrowserDriver,
    region: Option<&str>,
) -> (Option<ElementHandle>, Option<String>) {
    let Some(name) = region else {
        return (None, None);
    };

    let named_dialog = format!("[role=\"dialog\"][aria-label=\"{name}\"]");
    if let Ok(Some(handle)) = driver.query(&named_dialog).await {
        return (Some(handle), None);
    }

    if let Ok(Some(handle)) = driver.query("[role=\"dialog\"]").await {
        return (Some(handle), None);
    }

    let edit_form = format!("form[aria-label=\"{name}\"]");
    if let Ok(Some(handle)) = driver.query(&edit_form).await {
        return (Some(handle), None);
    }

    if let Ok(Some(handle)) = driver.query("[role=\"main\"]").await {
        return (Some(handle), None);
    }
    if let Ok(Some(handle)) = driver.query("main").await {
        return (Some(handle), None);
    }

    let warning = format!("region '{name}' did not match any container, falling back to page scope");
    warn!(region = name, "{}", warning);
    (None, Some(warning))
}
