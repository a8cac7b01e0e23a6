use soulbrowser_browser_driver::{BrowserDriver, DOM_SKELETON_SCRIPT};
use soulbrowser_selector_cache::dom_skeleton_hash;

/// Evaluate the canonical skeleton script and hash the result (§4.2
/// drift detection). `None` when the driver doesn't support the
/// convention or the page hands back something that isn't a string —
/// per §4.2 "absence of a cached hash disables drift for that request
/// only", this is never treated as a fault.
pub async fn compute_dom_hash(driver: &dyn BrowserDriver) -> Option<String> {
    match driver.evaluate(DOM_SKELETON_SCRIPT).await {
        Ok(serde_json::Value::String(skeleton)) => Some(dom_skeleton_hash(&skeleton)),
        _ => None,
    }
}
