use soulbrowser_browser_driver::{BrowserDriver, ElementHandle};

use crate::errors::ExecutorError;

/// Whether an autocomplete dropdown looks open (§4.6 "press", step 0):
/// a listbox/combobox role present, or a class-token match.
async fn autocomplete_dropdown_visible(driver: &dyn BrowserDriver) -> Result<bool, ExecutorError> {
    if let Some(handle) = driver.query("role=listbox").await? {
        if driver.is_visible(&handle).await? {
            return Ok(true);
        }
    }
    if let Some(handle) = driver.query("role=combobox").await? {
        if driver.is_visible(&handle).await? {
            return Ok(true);
        }
    }
    for handle in driver.query_all("[class]").await? {
        if let Some(class) = driver.attribute(&handle, "class").await? {
            if class.split_whitespace().any(|t| t == "autocomplete" || t == "dropdown") {
                if driver.is_visible(&handle).await? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

async fn click_submit_affordance(driver: &dyn BrowserDriver, timeout_ms: u64) -> Result<(), ExecutorError> {
    if let Some(handle) = driver.query("[type=\"submit\"]").await? {
        driver.click(&handle, timeout_ms).await?;
        return Ok(());
    }
    if let Some(handle) = driver.query("role=button[name=\"Submit\"]").await? {
        driver.click(&handle, timeout_ms).await?;
        return Ok(());
    }
    Err(ExecutorError::PressChainExhausted)
}

/// Press fallback chain (§4.6 "press"): an open autocomplete dropdown
/// is handled first by clicking the nearest submit affordance; failing
/// that (or when no dropdown is open), try direct press, then a
/// form-scoped submit click, then `form.submit()` via `evaluate`.
pub async fn press_with_fallback_chain(
    driver: &dyn BrowserDriver,
    handle: &ElementHandle,
    key: &str,
    timeout_ms: u64,
) -> Result<(), ExecutorError> {
    if autocomplete_dropdown_visible(driver).await? {
        if click_submit_affordance(driver, timeout_ms).await.is_ok() {
            return Ok(());
        }
    }

    if driver.press_on(handle, key, timeout_ms).await.is_ok() {
        return Ok(());
    }

    if click_submit_affordance(driver, timeout_ms).await.is_ok() {
        return Ok(());
    }

    driver
        .evaluate("document.querySelector('form').submit()")
        .await?;
    Ok(())
}
