use std::time::Duration;

use soulbrowser_browser_driver::{BrowserDriver, LoadState};

const NAVIGATION_RACE_TIMEOUT_MS: u64 = 4_000;
const POLL_INTERVAL_MS: u64 = 100;

/// Poll for the first of `success_token_selectors` to appear. The exact
/// selector family is collaborator-provided opaque configuration (§9
/// O2); this crate only knows how to poll for them.
async fn wait_for_any_success_token(driver: &dyn BrowserDriver, selectors: &[String]) {
    loop {
        for selector in selectors {
            if let Ok(Some(_)) = driver.query(selector).await {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Race a navigation-completed wait against a DOM success-token wait,
/// bounded by a 4-second timeout (§4.6 "Navigation detection"). URL
/// comparison before/after is an additional signal layered on top.
pub async fn detect_navigation(
    driver: &dyn BrowserDriver,
    url_before: &str,
    success_token_selectors: &[String],
) -> bool {
    let timeout = Duration::from_millis(NAVIGATION_RACE_TIMEOUT_MS);
    let raced = tokio::time::timeout(timeout, async {
        tokio::select! {
            _ = driver.wait_for_load_state(LoadState::NetworkIdle, NAVIGATION_RACE_TIMEOUT_MS) => {},
            _ = wait_for_any_success_token(driver, success_token_selectors) => {},
        }
    })
    .await
    .is_ok();

    let url_after = driver.current_url().await.unwrap_or_default();
    raced || url_after != url_before
}
