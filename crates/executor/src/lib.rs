//! The Executor (C6, §4.6): action dispatch with action-specific
//! fallback chains, navigation detection, and post-action bookkeeping
//! onto the single-writer [`RunState`].

mod errors;
mod fill;
mod navigation;
mod press;

pub use errors::ExecutorError;

use std::time::Instant;

use soulbrowser_browser_driver::{BrowserDriver, LoadState};
use soulbrowser_core_types::{Action, DiscoverySource, ExecutionRecord, Failure, RunState};
use tracing::{debug, warn};

/// Fixed per-call action timeout. The Gate's checks scale with
/// `heal_round` (§4.5); the Executor's direct driver calls do not —
/// retries happen at the Healer/Orchestrator level, not inside a
/// single action dispatch.
const ACTION_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_PRESS_KEY: &str = "Enter";

/// Collaborator-provided, opaque configuration for this crate (§9 O2):
/// the DOM "success token" selector family and where best-effort
/// screenshots land.
#[derive(Clone, Debug, Default)]
pub struct ExecutorConfig {
    pub success_token_selectors: Vec<String>,
    pub screenshot_dir: Option<String>,
}

/// Outcome of one [`execute_step`] call. `awaiting_human` signals the
/// Orchestrator to transition to `AWAIT_HUMAN` instead of looping back
/// to `INIT` even though `success` is `true`.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub success: bool,
    pub failure: Failure,
    pub navigation_occurred: bool,
    pub awaiting_human: bool,
}

impl StepOutcome {
    fn ok(navigation_occurred: bool, awaiting_human: bool) -> Self {
        Self {
            success: true,
            failure: Failure::None,
            navigation_occurred,
            awaiting_human,
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            failure: Failure::Timeout,
            navigation_occurred: false,
            awaiting_human: false,
        }
    }
}

/// Run the current step's action against `selector` and, on success,
/// record the result onto `run` (§4.6 "Post-action"). Any driver fault
/// surfaces as `Failure::Timeout` (§7) rather than propagating — the
/// Orchestrator routes to the Healer on a failed [`StepOutcome`].
pub async fn execute_step(
    driver: &dyn BrowserDriver,
    run: &mut RunState,
    selector: &str,
    config: &ExecutorConfig,
) -> StepOutcome {
    let step_idx = run.step_idx;
    let heal_round = run.heal_round;
    let Some(entry) = run.plan.get(step_idx) else {
        return StepOutcome::failed();
    };
    let action = entry.step.action;
    let value = entry.step.value.clone();
    let discovery_source = entry.discovery_source;

    if action == Action::Wait {
        run.context.insert("awaiting_human".to_string(), "true".to_string());
        record_success(
            run,
            step_idx,
            Some(selector.to_string()),
            action,
            value,
            heal_round,
            discovery_source,
            0,
            None,
        );
        return StepOutcome::ok(false, true);
    }

    if action == Action::Navigate {
        let start = Instant::now();
        let dest = match &value {
            Some(url) => url.clone(),
            None => return StepOutcome::failed(),
        };
        if driver.goto(&dest, LoadState::DomContentLoaded).await.is_err() {
            return StepOutcome::failed();
        }
        let duration_ms = start.elapsed().as_millis() as u64;
        record_success(
            run,
            step_idx,
            None,
            action,
            value,
            heal_round,
            discovery_source,
            duration_ms,
            None,
        );
        return StepOutcome::ok(true, false);
    }

    let url_before = driver.current_url().await.unwrap_or_default();

    let Ok(Some(handle)) = driver.query(selector).await else {
        return StepOutcome::failed();
    };
    let _ = driver.scroll_into_view(&handle).await;

    let start = Instant::now();
    let dispatch_result = match action {
        Action::Click => driver.click(&handle, ACTION_TIMEOUT_MS).await.map_err(ExecutorError::from),
        Action::Fill => {
            let value = value.clone().unwrap_or_default();
            fill::fill_with_activator(driver, &handle, &value, ACTION_TIMEOUT_MS).await
        }
        Action::Type => {
            let value = value.clone().unwrap_or_default();
            driver
                .type_text(&handle, &value, ACTION_TIMEOUT_MS)
                .await
                .map_err(ExecutorError::from)
        }
        Action::Press => {
            let key = value.clone().unwrap_or_else(|| DEFAULT_PRESS_KEY.to_string());
            press::press_with_fallback_chain(driver, &handle, &key, ACTION_TIMEOUT_MS).await
        }
        Action::Select => {
            let value = value.clone().unwrap_or_default();
            driver
                .select(&handle, &value, ACTION_TIMEOUT_MS)
                .await
                .map_err(ExecutorError::from)
        }
        Action::Check => driver.check(&handle, ACTION_TIMEOUT_MS).await.map_err(ExecutorError::from),
        Action::Uncheck => driver.uncheck(&handle, ACTION_TIMEOUT_MS).await.map_err(ExecutorError::from),
        Action::Hover => driver.hover(&handle, ACTION_TIMEOUT_MS).await.map_err(ExecutorError::from),
        Action::Focus => driver.focus(&handle, ACTION_TIMEOUT_MS).await.map_err(ExecutorError::from),
        Action::Wait | Action::Navigate => unreachable!("handled above"),
    };

    if dispatch_result.is_err() {
        return StepOutcome::failed();
    }

    let navigation_occurred = matches!(action, Action::Click | Action::Press)
        && navigation::detect_navigation(driver, &url_before, &config.success_token_selectors).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let screenshot_path = capture_screenshot(driver, config, step_idx).await;

    run.last_selector_ok = Some(selector.to_string());
    record_success(
        run,
        step_idx,
        Some(selector.to_string()),
        action,
        value,
        heal_round,
        discovery_source,
        duration_ms,
        screenshot_path,
    );

    StepOutcome::ok(navigation_occurred, false)
}

#[allow(clippy::too_many_arguments)]
fn record_success(
    run: &mut RunState,
    step_idx: usize,
    selector: Option<String>,
    action: Action,
    value: Option<String>,
    heal_round: u32,
    discovery_source: DiscoverySource,
    duration_ms: u64,
    screenshot_path: Option<String>,
) {
    run.executed_steps.push(ExecutionRecord {
        step_idx,
        selector,
        action,
        value,
        heal_round,
        discovery_source,
        duration_ms,
        screenshot_path,
    });
}

/// Best-effort screenshot (§4.6 "non-critical; failures ignored"; §7
/// "Screenshot faults → log only").
async fn capture_screenshot(
    driver: &dyn BrowserDriver,
    config: &ExecutorConfig,
    step_idx: usize,
) -> Option<String> {
    let dir = config.screenshot_dir.as_ref()?;
    let path = format!("{dir}/step-{step_idx}.png");
    match driver.screenshot(&path).await {
        Ok(()) => Some(path),
        Err(err) => {
            warn!(error = %err, step_idx, "screenshot capture faulted, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_browser_driver::mock::{MockDriver, MockElement};
    use soulbrowser_core_types::{plan_for_steps, RunId, Step};

    fn run_with(steps: Vec<Step>) -> RunState {
        let plan = plan_for_steps(&steps);
        let mut state = RunState::new(RunId::new(), plan);
        for entry in state.plan.iter_mut() {
            entry.selector = Some(format!("#{}", entry.step.id));
        }
        state
    }

    #[tokio::test]
    async fn click_records_execution_and_sets_last_selector_ok() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("login", "button").with_role("button", "Log in")],
        );
        let mut run = run_with(vec![Step::new("login", "Log in", Action::Click)]);
        let outcome = execute_step(&driver, &mut run, "#login", &ExecutorConfig::default()).await;

        assert!(outcome.success);
        assert_eq!(run.last_selector_ok, Some("#login".to_string()));
        assert_eq!(run.executed_steps.len(), 1);
        assert_eq!(run.executed_steps[0].action, Action::Click);
    }

    #[tokio::test]
    async fn fill_targets_directly_when_element_already_editable() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("u1", "input").with_attr("aria-label", "Username")],
        );
        let mut run = run_with(vec![
            Step::new("u1", "Username", Action::Fill).with_value("alice"),
        ]);
        let outcome = execute_step(&driver, &mut run, "#u1", &ExecutorConfig::default()).await;

        assert!(outcome.success);
        assert!(driver
            .calls()
            .iter()
            .any(|c| matches!(c, soulbrowser_browser_driver::mock::MockCall::Fill(id, v) if id == "u1" && v == "alice")));
    }

    #[tokio::test]
    async fn wait_action_sets_awaiting_human_without_driver_dispatch() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("approval", "div")],
        );
        let mut run = run_with(vec![Step::new("approval", "Approval", Action::Wait)]);
        let outcome = execute_step(&driver, &mut run, "#approval", &ExecutorConfig::default()).await;

        assert!(outcome.success);
        assert!(outcome.awaiting_human);
        assert_eq!(run.context.get("awaiting_human"), Some(&"true".to_string()));
    }

    #[tokio::test]
    async fn vanished_element_fails_with_timeout() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let mut run = run_with(vec![Step::new("ghost", "Ghost", Action::Click)]);
        let outcome = execute_step(&driver, &mut run, "#ghost", &ExecutorConfig::default()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.failure, Failure::Timeout);
        assert!(run.executed_steps.is_empty());
    }
}
