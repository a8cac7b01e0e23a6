use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{Action, Failure, RunState};
use soulbrowser_executor::{execute_step, ExecutorConfig};
use soulbrowser_gate::{press_after_fill_fast_path, run_gate, GateParams};
use soulbrowser_healer::NAVIGATION_CONTEXT_KEY;
use tracing::debug;

use crate::state::OrchState;

/// Run the gate's five checks scoped by `region`, mapping a driver
/// fault to `Failure::Timeout` (§4.5 "timeout or absent handle →
/// timeout").
async fn gate_check(
    driver: &dyn BrowserDriver,
    selector: &str,
    region: Option<&str>,
    heal_round: u32,
) -> Failure {
    let (container, warning) = soulbrowser_discovery::resolve_region(driver, region).await;
    if let Some(warning) = warning {
        debug!("{}", warning);
    }
    let params = GateParams::for_heal_round(heal_round);
    match run_gate(driver, selector, container.as_ref(), params).await {
        Ok(outcome) => outcome.failure_kind(),
        Err(_) => Failure::Timeout,
    }
}

/// The `GATE_AND_EXECUTE` state (§4.8): gate the resolved selector
/// (skipped for `wait`, short-circuited by the press-after-fill fast
/// path when applicable), then execute the step's action.
pub async fn on_gate_and_execute(
    driver: &dyn BrowserDriver,
    run: &mut RunState,
    executor_config: &ExecutorConfig,
) -> OrchState {
    let step_idx = run.step_idx;
    let Some(entry) = run.plan.get(step_idx).cloned() else {
        return OrchState::Done;
    };
    let Some(selector) = entry.selector.clone() else {
        run.failure = Failure::Timeout;
        return OrchState::Heal;
    };

    if entry.step.action == Action::Wait {
        let outcome = execute_step(driver, run, &selector, executor_config).await;
        return if outcome.awaiting_human {
            OrchState::AwaitHuman
        } else if outcome.success {
            advance(run);
            OrchState::Init
        } else {
            run.failure = outcome.failure;
            OrchState::Heal
        };
    }

    let region = entry.step.region.clone();
    let use_fast_path =
        entry.step.action == Action::Press && run.last_selector_ok.as_deref() == Some(selector.as_str());

    let failure = if use_fast_path {
        match fast_path_check(driver, &selector).await {
            Some(true) => Failure::None,
            _ => gate_check(driver, &selector, region.as_deref(), run.heal_round).await,
        }
    } else {
        gate_check(driver, &selector, region.as_deref(), run.heal_round).await
    };

    if failure != Failure::None {
        run.failure = failure;
        return OrchState::Heal;
    }

    let outcome = execute_step(driver, run, &selector, executor_config).await;
    if outcome.awaiting_human {
        return OrchState::AwaitHuman;
    }
    if !outcome.success {
        run.failure = outcome.failure;
        return OrchState::Heal;
    }

    if outcome.navigation_occurred {
        run.context
            .insert(NAVIGATION_CONTEXT_KEY.to_string(), step_idx.to_string());
    }
    advance(run);
    OrchState::Init
}

/// §4.5 press-after-fill fast path: settle + a visibility re-check,
/// short-circuiting the full gate. `None` when the handle no longer
/// resolves at all, which falls back to the full gate the same as a
/// failed re-check would.
async fn fast_path_check(driver: &dyn BrowserDriver, selector: &str) -> Option<bool> {
    let handle = driver.query(selector).await.ok().flatten()?;
    press_after_fill_fast_path(driver, &handle).await.ok()
}

/// §4.8 `GATE_AND_EXECUTE → INIT (success; step_idx++, heal_round=0)`.
fn advance(run: &mut RunState) {
    run.step_idx += 1;
    run.heal_round = 0;
    run.failure = Failure::None;
}
