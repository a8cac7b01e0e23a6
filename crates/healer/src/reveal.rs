use std::time::Duration;

use soulbrowser_browser_driver::{BrowserDriver, LoadState};

use crate::HealerConfig;

const LAZY_SCROLL_DY: f64 = 200.0;
const NETWORK_IDLE_TIMEOUT_MS: u64 = 1_500;

/// Step 1 of a heal round (§4.7 "Reveal"): bring the page to front,
/// scroll the target into view if it still resolves, nudge the
/// viewport for lazy-loaded layouts, dismiss overlays, and give the
/// network a short chance to settle. Appends a human-readable action
/// string per sub-step performed, for the round's [`soulbrowser_core_types::HealEvent`].
pub async fn reveal(
    driver: &dyn BrowserDriver,
    selector: Option<&str>,
    config: &HealerConfig,
) -> Vec<String> {
    let mut actions = Vec::new();

    let _ = driver.bring_to_front().await;
    actions.push("bring_to_front".to_string());

    if let Some(selector) = selector {
        if let Ok(Some(handle)) = driver.query(selector).await {
            if driver.scroll_into_view(&handle).await.is_ok() {
                actions.push("scroll_into_view".to_string());
            }
        }
    }

    let _ = driver.scroll_by(0.0, LAZY_SCROLL_DY).await;
    actions.push("scroll_by_lazy_layout".to_string());

    if driver.press_key("Escape").await.is_ok() {
        actions.push("press_escape".to_string());
    }

    for backdrop in &config.backdrop_selectors {
        if let Ok(Some(handle)) = driver.query(backdrop).await {
            if driver.click(&handle, 500).await.is_ok() {
                actions.push(format!("click_backdrop:{backdrop}"));
            }
        }
    }

    for close_button in &config.close_button_selectors {
        if let Ok(Some(handle)) = driver.query(close_button).await {
            if driver.click(&handle, 500).await.is_ok() {
                actions.push(format!("click_close:{close_button}"));
            }
        }
    }

    let _ = driver
        .wait_for_load_state(LoadState::NetworkIdle, NETWORK_IDLE_TIMEOUT_MS)
        .await;
    actions.push("wait_network_idle".to_string());

    // Overlay dismissal can itself shift layout; give it a beat before
    // the stability wait samples the bounding box.
    tokio::time::sleep(Duration::from_millis(50)).await;

    actions
}
