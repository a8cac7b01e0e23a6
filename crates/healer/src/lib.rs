//! The Healer (C7, §4.7): a deterministic reveal → reprobe → stability
//! wait → re-gate playbook, bounded by the caller's heal-round budget,
//! feeding outcomes back into the Heal History (C3) learned priors.
//!
//! One call to [`run_heal_round`] is one round (§4.7 "One invocation =
//! one round"). The Orchestrator owns the budget check (`heal_round >=
//! MAX_HEAL_ROUNDS`) and decides whether to call this again; this crate
//! only executes a single round and reports whether it healed the step.

mod errors;
mod reprobe;
mod reveal;

pub use errors::HealerError;
pub use reprobe::DISCOVERY_FAILED_SENTINEL;

use std::time::{Duration, Instant};

use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{DiscoverySource, EngineConfig, Failure, HealEvent, RunState};
use soulbrowser_gate::GateParams;
use soulbrowser_heal_history::HealHistory;
use soulbrowser_telemetry::Telemetry;
use tracing::{info, warn};

use reprobe::ReprobeOutcome;

/// Collaborator-provided, opaque configuration for overlay dismissal
/// (§4.7 "Reveal": "click known backdrop selectors; click known
/// close-button selectors"). Site-family specific, same spirit as the
/// Executor's `success_token_selectors` (§9 O2).
#[derive(Clone, Debug, Default)]
pub struct HealerConfig {
    pub backdrop_selectors: Vec<String>,
    pub close_button_selectors: Vec<String>,
}

/// Context key the Orchestrator sets whenever a step's execution
/// caused navigation (§4.6 "Navigation detection"); consulted by this
/// crate's navigation-during-healing bypass (§4.7).
pub const NAVIGATION_CONTEXT_KEY: &str = "navigation_occurred_after_step";

/// Outcome of one heal round.
#[derive(Clone, Copy, Debug)]
pub struct HealOutcome {
    /// Whether the round's re-gate passed (or the navigation bypass
    /// applied) — the Orchestrator retries execution on `true`.
    pub healed: bool,
    /// Set when the round short-circuited via the navigation-during-
    /// healing rule rather than running the full playbook; the
    /// Orchestrator advances `step_idx` directly in this case rather
    /// than looping back through `GATE_AND_EXECUTE`.
    pub navigation_bypass: bool,
}

/// Whether the current step's failure looks like "element not found"
/// immediately after the previous step caused navigation (§4.7
/// "Navigation-during-healing"): only `Failure::Timeout` — the catch-
/// all for a discovery miss or an absent gate handle — qualifies.
fn navigation_bypass_applies(run: &RunState) -> bool {
    if run.step_idx == 0 || run.failure != Failure::Timeout {
        return false;
    }
    run.context
        .get(NAVIGATION_CONTEXT_KEY)
        .and_then(|v| v.parse::<usize>().ok())
        == Some(run.step_idx - 1)
}

/// Run one heal round for the step at `run.step_idx` (§4.7). Mutates
/// `run` directly (selector healing, heal_round bump, event/telemetry
/// bookkeeping) following the same "helper mutates the Orchestrator's
/// owned RunState" pattern as `soulbrowser_executor::execute_step`.
pub async fn run_heal_round(
    driver: &dyn BrowserDriver,
    run: &mut RunState,
    url_pattern: &str,
    config: &EngineConfig,
    healer_config: &HealerConfig,
    heal_history: &HealHistory,
    telemetry: &Telemetry,
) -> HealOutcome {
    let step_idx = run.step_idx;

    if navigation_bypass_applies(run) {
        let original_selector = run.plan[step_idx].selector.clone();
        run.heal_events.push(HealEvent {
            round: run.heal_round,
            step_idx,
            failure_type: run.failure,
            actions: vec!["navigation_bypass".to_string()],
            original_selector,
            new_selector: None,
            learned_strategies: None,
            gate_result: None,
            duration_ms: 0,
            success: true,
        });
        run.context.remove(NAVIGATION_CONTEXT_KEY);
        run.failure = Failure::None;
        telemetry.record_heal_success();
        info!(step_idx, "navigation observed on previous step, treating element-not-found as healed");
        return HealOutcome {
            healed: true,
            navigation_bypass: true,
        };
    }

    let start = Instant::now();
    run.heal_round += 1;
    let heal_round = run.heal_round;

    let original_selector = run.plan[step_idx].selector.clone();
    let mut actions = reveal::reveal(driver, original_selector.as_deref(), healer_config).await;

    let mut new_selector_for_event = None;
    let mut learned_strategies_for_event = None;
    let mut attempted_strategy = run.plan[step_idx]
        .strategy
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    if reprobe::should_reprobe(run.failure) {
        let step = run.plan[step_idx].step.clone();
        match reprobe::reprobe(
            driver,
            &step,
            url_pattern,
            original_selector.as_deref(),
            heal_history,
            config,
        )
        .await
        {
            Ok((outcome, learned_names)) => {
                actions.push("reprobe".to_string());
                if !learned_names.is_empty() {
                    learned_strategies_for_event = Some(learned_names);
                }
                match outcome {
                    ReprobeOutcome::NewSelector(result) => {
                        new_selector_for_event = Some(result.selector.clone());
                        attempted_strategy = result.strategy.name().to_string();
                        let entry = &mut run.plan[step_idx];
                        entry.selector = Some(result.selector.clone());
                        entry.strategy = Some(result.strategy.name().to_string());
                        entry.confidence = result.score;
                        entry.stable = result.stable;
                        entry.discovery_source = DiscoverySource::Healed;
                    }
                    ReprobeOutcome::NoProgressSameSelector => {
                        actions.push("no_progress_same_selector".to_string());
                    }
                    ReprobeOutcome::DiscoveryFailed => {
                        actions.push("discovery_failed".to_string());
                        let entry = &mut run.plan[step_idx];
                        entry.selector = Some(DISCOVERY_FAILED_SENTINEL.to_string());
                        entry.discovery_source = DiscoverySource::Healed;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, step_idx, "reprobe faulted, round continues without a new selector");
                actions.push(format!("reprobe_error:{err}"));
            }
        }
    }

    // Stability wait (§4.7 step 3): settle proportionally to how many
    // rounds have already run before the full re-gate samples the
    // bounding box again with its own adaptive parameters.
    tokio::time::sleep(Duration::from_millis(100 + 50 * heal_round as u64)).await;
    actions.push("stability_wait".to_string());

    let selector = run.plan[step_idx].selector.clone();
    let region = run.plan[step_idx].step.region.clone();
    let gate_result = match &selector {
        Some(selector) => {
            let (container, warning) = soulbrowser_discovery::resolve_region(driver, region.as_deref()).await;
            if let Some(warning) = warning {
                actions.push(format!("region_warning:{warning}"));
            }
            let params = GateParams::for_heal_round(heal_round);
            match soulbrowser_gate::run_gate(driver, selector, container.as_ref(), params).await {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    actions.push(format!("gate_error:{err}"));
                    None
                }
            }
        }
        None => None,
    };
    actions.push("re_gate".to_string());

    let success = gate_result.as_ref().map(|g| g.all_pass()).unwrap_or(false);
    let duration_ms = start.elapsed().as_millis() as u64;

    run.heal_events.push(HealEvent {
        round: heal_round,
        step_idx,
        failure_type: run.failure,
        actions,
        original_selector,
        new_selector: new_selector_for_event,
        learned_strategies: learned_strategies_for_event,
        gate_result: gate_result.clone(),
        duration_ms,
        success,
    });

    heal_history
        .record_outcome(
            &run.plan[step_idx].step.element_label,
            url_pattern,
            &attempted_strategy,
            success,
            duration_ms,
        )
        .await;

    if success {
        run.failure = Failure::None;
        telemetry.record_heal_success();
    } else {
        run.failure = gate_result
            .as_ref()
            .map(|g| g.failure_kind())
            .unwrap_or(Failure::Timeout);
        telemetry.record_heal_failure();
    }

    HealOutcome {
        healed: success,
        navigation_bypass: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_browser_driver::mock::{MockDriver, MockElement};
    use soulbrowser_core_types::{plan_for_steps, Action, RunId, Step};

    fn run_with(steps: Vec<Step>) -> RunState {
        let plan = plan_for_steps(&steps);
        RunState::new(RunId::new(), plan)
    }

    #[tokio::test]
    async fn heals_a_not_visible_element_via_scroll_into_view() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("submit", "button").with_attr("aria-label", "Submit")],
        );
        let mut run = run_with(vec![Step::new("submit", "Submit", Action::Click)]);
        run.plan[0].selector = Some("[aria-label=\"Submit\"]".to_string());
        run.plan[0].strategy = Some("aria-label".to_string());
        run.failure = Failure::NotVisible;

        let config = EngineConfig::default();
        let healer_config = HealerConfig::default();
        let heal_history = HealHistory::new();
        let telemetry = Telemetry::new();

        let outcome = run_heal_round(
            &driver,
            &mut run,
            "https://example.com",
            &config,
            &healer_config,
            &heal_history,
            &telemetry,
        )
        .await;

        assert!(outcome.healed);
        assert_eq!(run.heal_round, 1);
        assert_eq!(run.heal_events.len(), 1);
        assert_eq!(run.heal_events[0].round, 1);
        assert!(run
            .heal_events[0]
            .actions
            .iter()
            .any(|a| a == "scroll_into_view"));
        assert_eq!(run.failure, Failure::None);
    }

    #[tokio::test]
    async fn reprobes_on_timeout_using_learned_strategies() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("e1", "input").with_attr("data-testid", "Email")],
        );
        let heal_history = HealHistory::new();
        heal_history
            .record_outcome("Email", "https://example.com", "data-test-hook", true, 50)
            .await;

        let mut run = run_with(vec![Step::new("e1", "Email", Action::Fill)]);
        run.plan[0].selector = Some("#ghost".to_string());
        run.failure = Failure::Timeout;

        let config = EngineConfig::default();
        let healer_config = HealerConfig::default();
        let telemetry = Telemetry::new();

        let outcome = run_heal_round(
            &driver,
            &mut run,
            "https://example.com",
            &config,
            &healer_config,
            &heal_history,
            &telemetry,
        )
        .await;

        assert!(outcome.healed);
        assert_eq!(
            run.plan[0].selector,
            Some("[data-testid=\"Email\"]".to_string())
        );
        assert_eq!(run.heal_events[0].new_selector, run.plan[0].selector);
    }

    #[tokio::test]
    async fn discovery_failure_during_reprobe_writes_the_sentinel() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let heal_history = HealHistory::new();
        let mut run = run_with(vec![Step::new("ghost", "Nonexistent", Action::Click)]);
        run.plan[0].selector = Some("#ghost".to_string());
        run.failure = Failure::Timeout;

        let outcome = run_heal_round(
            &driver,
            &mut run,
            "https://example.com",
            &EngineConfig::default(),
            &HealerConfig::default(),
            &heal_history,
            &Telemetry::new(),
        )
        .await;

        assert!(!outcome.healed);
        assert_eq!(
            run.plan[0].selector,
            Some(DISCOVERY_FAILED_SENTINEL.to_string())
        );
        assert_eq!(run.failure, Failure::Timeout);
    }

    #[tokio::test]
    async fn navigation_bypass_short_circuits_the_full_playbook() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let heal_history = HealHistory::new();
        let mut run = run_with(vec![
            Step::new("a", "A", Action::Click),
            Step::new("b", "B", Action::Click),
        ]);
        run.step_idx = 1;
        run.failure = Failure::Timeout;
        run.context
            .insert(NAVIGATION_CONTEXT_KEY.to_string(), "0".to_string());

        let outcome = run_heal_round(
            &driver,
            &mut run,
            "https://example.com",
            &EngineConfig::default(),
            &HealerConfig::default(),
            &heal_history,
            &Telemetry::new(),
        )
        .await;

        assert!(outcome.healed);
        assert!(outcome.navigation_bypass);
        assert_eq!(run.heal_round, 0, "bypass does not consume a round");
        assert_eq!(run.failure, Failure::None);
        assert!(!run.context.contains_key(NAVIGATION_CONTEXT_KEY));
    }

    #[tokio::test]
    async fn heal_budget_is_never_exceeded_across_repeated_failing_rounds() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let heal_history = HealHistory::new();
        let config = EngineConfig::default();
        let mut run = run_with(vec![Step::new("ghost", "Nonexistent", Action::Click)]);
        run.plan[0].selector = Some("#ghost".to_string());
        run.failure = Failure::Timeout;

        for _ in 0..config.max_heal_rounds {
            let outcome = run_heal_round(
                &driver,
                &mut run,
                "https://example.com",
                &config,
                &HealerConfig::default(),
                &heal_history,
                &Telemetry::new(),
            )
            .await;
            assert!(!outcome.healed);
            assert!(run.heal_round <= config.max_heal_rounds);
        }
        assert_eq!(run.heal_round, config.max_heal_rounds);
        assert_eq!(run.heal_events.len(), config.max_heal_rounds as usize);
    }
}
