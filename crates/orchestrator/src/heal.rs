use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{EngineConfig, RunState};
use soulbrowser_healer::{run_heal_round, HealerConfig};
use soulbrowser_heal_history::HealHistory;
use soulbrowser_selector_cache::{normalize_url, SelectorCache, SessionContext};
use soulbrowser_telemetry::Telemetry;

use crate::state::OrchState;

/// The `HEAL` state (§4.8, §4.7): run one round of the Healer's
/// playbook. A successful round (or a navigation bypass) routes back
/// to re-execution; an unsuccessful round either consumes another
/// round or, once the budget is exhausted, ends the run.
#[allow(clippy::too_many_arguments)]
pub async fn on_heal(
    driver: &dyn BrowserDriver,
    run: &mut RunState,
    cache: &SelectorCache,
    heal_history: &HealHistory,
    telemetry: &Telemetry,
    config: &EngineConfig,
    healer_config: &HealerConfig,
    session: &SessionContext,
) -> OrchState {
    let url = driver.current_url().await.unwrap_or_default();
    let url_pattern = normalize_url(&url);

    let outcome = run_heal_round(
        driver,
        run,
        &url_pattern,
        config,
        healer_config,
        heal_history,
        telemetry,
    )
    .await;

    if outcome.navigation_bypass {
        run.step_idx += 1;
        run.heal_round = 0;
        return OrchState::Init;
    }

    if outcome.healed {
        if let Some(entry) = run.plan.get(run.step_idx) {
            if entry.stable {
                if let (Some(selector), Some(strategy)) = (&entry.selector, &entry.strategy) {
                    cache
                        .save(
                            &url,
                            &entry.step.element_label,
                            session,
                            selector,
                            strategy,
                            entry.confidence,
                            entry.stable,
                            None,
                        )
                        .await;
                }
            }
        }
        return OrchState::GateAndExecute;
    }

    if run.heal_round >= config.max_heal_rounds {
        return OrchState::Done;
    }
    OrchState::Heal
}
