use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{DiscoverySource, EngineConfig, Failure, RunState};
use soulbrowser_discovery::{discover, Intent};
use soulbrowser_selector_cache::{CacheLookup, SelectorCache, SessionContext};
use soulbrowser_telemetry::Telemetry;
use tracing::debug;

use crate::dom_hash::compute_dom_hash;
use crate::state::OrchState;

/// The `DISCOVER` state (§4.4, §4.8): the reuse rule first, then a
/// cache lookup, then a fresh cascade run — in that order, since reuse
/// is cheaper than a cache round-trip and a cache hit is cheaper than
/// the cascade.
pub async fn on_discover(
    driver: &dyn BrowserDriver,
    run: &mut RunState,
    cache: &SelectorCache,
    config: &EngineConfig,
    telemetry: &Telemetry,
    session: &SessionContext,
) -> OrchState {
    let step_idx = run.step_idx;

    if step_idx > 0 {
        if let Some(prev) = run.plan.get(step_idx - 1) {
            let same_label = prev.step.element_label == run.plan[step_idx].step.element_label;
            let reusable = same_label && prev.has_selector();
            if reusable {
                let prev_selector = prev.selector.clone();
                let prev_strategy = prev.strategy.clone();
                let prev_confidence = prev.confidence;
                let prev_stable = prev.stable;
                let entry = &mut run.plan[step_idx];
                entry.selector = prev_selector;
                entry.strategy = prev_strategy;
                entry.confidence = prev_confidence;
                entry.stable = prev_stable;
                entry.discovery_source = DiscoverySource::ReusedPrev;
                debug!(step_idx, "reused previous step's selector (same element_label)");
                return OrchState::GateAndExecute;
            }
        }
    }

    let url = driver.current_url().await.unwrap_or_default();
    let dom_hash = compute_dom_hash(driver).await;
    let label = run.plan[step_idx].step.element_label.clone();

    match cache.lookup(&url, &label, session, dom_hash.as_deref()).await {
        CacheLookup::Hit {
            selector,
            strategy,
            confidence,
            source,
        } => {
            let entry = &mut run.plan[step_idx];
            entry.selector = Some(selector);
            entry.strategy = Some(strategy);
            entry.confidence = confidence;
            entry.stable = true;
            entry.discovery_source = source;
            telemetry.record_strategy_used();
            OrchState::GateAndExecute
        }
        CacheLookup::Miss => {
            let intent = Intent::from(&run.plan[step_idx].step);
            match discover(driver, &intent, config).await {
                Ok(Some(result)) => {
                    let entry = &mut run.plan[step_idx];
                    entry.selector = Some(result.selector.clone());
                    entry.strategy = Some(result.strategy.name().to_string());
                    entry.confidence = result.score;
                    entry.stable = result.stable;
                    entry.discovery_source = DiscoverySource::Fresh;
                    telemetry.record_strategy_used();

                    if result.stable {
                        cache
                            .save(
                                &url,
                                &label,
                                session,
                                &result.selector,
                                result.strategy.name(),
                                result.score,
                                result.stable,
                                dom_hash.as_deref(),
                            )
                            .await;
                    }
                    OrchState::GateAndExecute
                }
                Ok(None) => {
                    run.failure = Failure::Timeout;
                    OrchState::Heal
                }
                Err(err) => {
                    debug!(error = %err, step_idx, "discovery faulted, routing to heal");
                    run.failure = Failure::Timeout;
                    OrchState::Heal
                }
            }
        }
    }
}
