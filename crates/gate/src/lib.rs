//! The Actionability Gate (C5, §4.5): five independent checks — unique,
//! visible, enabled, stable_bbox, scoped — all required before the
//! Executor is allowed to act on a resolved selector.

mod errors;

pub use errors::GateError;

use std::time::Duration;

use soulbrowser_browser_driver::{BrowserDriver, ElementHandle};
use soulbrowser_core_types::GateOutcome;

/// Fixed delay between bounding-box samples while checking
/// `stable_bbox`. Not heal-round-adaptive; only sample count and
/// tolerance scale with the round (§4.5).
const SAMPLE_INTERVAL_MS: u64 = 80;

/// Settle delay before the press-after-fill fast path's visibility
/// re-check (§4.5 "a short settle and a visibility re-check").
const FAST_PATH_SETTLE_MS: u64 = 120;

/// Heal-round-adaptive gate parameters (§4.5): `samples = 3 +
/// heal_round`, `tol = 2.0 + 0.5·heal_round`, `timeout = 2000 +
/// 1000·heal_round` ms.
#[derive(Clone, Copy, Debug)]
pub struct GateParams {
    pub samples: u32,
    pub tol: f64,
    pub timeout_ms: u64,
}

impl GateParams {
    pub fn for_heal_round(heal_round: u32) -> Self {
        Self {
            samples: 3 + heal_round,
            tol: 2.0 + 0.5 * heal_round as f64,
            timeout_ms: 2_000 + 1_000 * heal_round as u64,
        }
    }
}

impl Default for GateParams {
    fn default() -> Self {
        Self::for_heal_round(0)
    }
}

/// Run all five checks against `selector`, scoped to `container` when
/// given. A selector matching zero elements is a driver-level fault
/// (§4.5 "timeout or absent handle → timeout"), not a failed `unique`
/// check — it surfaces as `Err`, not as `GateOutcome::unique == false`.
pub async fn run_gate(
    driver: &dyn BrowserDriver,
    selector: &str,
    container: Option<&ElementHandle>,
    params: GateParams,
) -> Result<GateOutcome, GateError> {
    let count = driver.locator_count(selector).await?;
    if count == 0 {
        return Err(GateError::Timeout(params.timeout_ms));
    }
    let handle = driver
        .query(selector)
        .await?
        .ok_or(GateError::Timeout(params.timeout_ms))?;

    let unique = count == 1;
    let visible = driver.is_visible(&handle).await?;
    let enabled = driver.is_enabled(&handle).await?;
    let scoped = match container {
        Some(container) => driver.is_descendant_of(&handle, container).await?,
        None => true,
    };
    let stable_bbox = sample_stable_bbox(driver, &handle, params).await?;

    let mut outcome = GateOutcome {
        unique,
        visible,
        enabled,
        stable_bbox,
        scoped,
        reason: None,
    };
    if !outcome.all_pass() {
        outcome.reason = Some(format!("{:?}", outcome.failure_kind()));
    }
    Ok(outcome)
}

async fn sample_stable_bbox(
    driver: &dyn BrowserDriver,
    handle: &ElementHandle,
    params: GateParams,
) -> Result<bool, GateError> {
    let Some(baseline) = driver.bounding_box(handle).await? else {
        return Err(GateError::Timeout(params.timeout_ms));
    };

    for _ in 1..params.samples {
        tokio::time::sleep(Duration::from_millis(SAMPLE_INTERVAL_MS)).await;
        let Some(sample) = driver.bounding_box(handle).await? else {
            return Err(GateError::Timeout(params.timeout_ms));
        };
        if sample.max_axis_delta(&baseline) > params.tol {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Press-after-fill fast path (§4.5): when `selector == last_selector_ok`
/// and the action is `press`, skip the full gate and only settle +
/// re-check visibility. Returns `true` when the fast path is sufficient;
/// callers fall back to [`run_gate`] on `false`.
pub async fn press_after_fill_fast_path(
    driver: &dyn BrowserDriver,
    handle: &ElementHandle,
) -> Result<bool, GateError> {
    tokio::time::sleep(Duration::from_millis(FAST_PATH_SETTLE_MS)).await;
    Ok(driver.is_visible(handle).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_browser_driver::mock::{MockDriver, MockElement};
    use soulbrowser_core_types::Failure;

    #[tokio::test]
    async fn all_checks_pass_for_a_stable_unique_element() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("u1", "input").with_attr("aria-label", "Username")],
        );
        let outcome = run_gate(&driver, "#u1", None, GateParams::default())
            .await
            .unwrap();
        assert!(outcome.all_pass());
        assert_eq!(outcome.failure_kind(), Failure::None);
    }

    #[tokio::test]
    async fn not_unique_reported_when_selector_matches_many() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![
                MockElement::new("r1", "div").with_attr("class", "row"),
                MockElement::new("r2", "div").with_attr("class", "row"),
            ],
        );
        let outcome = run_gate(&driver, ".row", None, GateParams::default())
            .await
            .unwrap();
        assert!(!outcome.unique);
        assert_eq!(outcome.failure_kind(), Failure::NotUnique);
    }

    #[tokio::test]
    async fn hidden_element_reports_not_visible() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("h1", "button").hidden()],
        );
        let outcome = run_gate(&driver, "#h1", None, GateParams::default())
            .await
            .unwrap();
        assert!(!outcome.visible);
        assert_eq!(outcome.failure_kind(), Failure::NotVisible);
    }

    #[tokio::test]
    async fn disabled_element_reports_disabled() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("d1", "button").disabled()],
        );
        let outcome = run_gate(&driver, "#d1", None, GateParams::default())
            .await
            .unwrap();
        assert!(!outcome.enabled);
        assert_eq!(outcome.failure_kind(), Failure::Disabled);
    }

    #[tokio::test]
    async fn absent_selector_is_a_timeout_error_not_a_failed_check() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let err = run_gate(&driver, "#ghost", None, GateParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Timeout(_)));
    }

    #[tokio::test]
    async fn heal_round_widens_sample_count_and_tolerance() {
        let params = GateParams::for_heal_round(2);
        assert_eq!(params.samples, 5);
        assert_eq!(params.tol, 3.0);
        assert_eq!(params.timeout_ms, 4_000);
    }
}
