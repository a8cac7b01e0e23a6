use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{EngineConfig, Step};
use soulbrowser_discovery::{discover, DiscoveryError, DiscoveryResult, Intent, Strategy};
use soulbrowser_heal_history::HealHistory;

/// Sentinel selector written onto a `PlanEntry` when a reprobe's
/// Discovery call returns nothing (§4.7 step 2: "set selector to a
/// sentinel indicating discovery-failure"). Guaranteed to never match
/// any real DOM node, so the subsequent gate fails cleanly with
/// `timeout` rather than looping on a stale selector.
pub const DISCOVERY_FAILED_SENTINEL: &str = "__heal_discovery_failed__";

/// Whether a failure kind warrants the reprobe step at all (§4.7
/// "Reprobe (only when failure ∈ {timeout, not_unique})").
pub fn should_reprobe(failure: soulbrowser_core_types::Failure) -> bool {
    use soulbrowser_core_types::Failure;
    matches!(failure, Failure::Timeout | Failure::NotUnique)
}

/// Outcome of [`reprobe`].
pub enum ReprobeOutcome {
    /// Discovery returned a selector different from the one that was
    /// failing; carries the full result so the caller can update the
    /// Plan entry and record `learned_strategies`.
    NewSelector(DiscoveryResult),
    /// Discovery returned the same selector that was already failing
    /// (§4.7: "record `no_progress_same_selector` but consume the
    /// round").
    NoProgressSameSelector,
    /// Discovery found nothing at all.
    DiscoveryFailed,
}

/// Step 2 of a heal round (§4.7 "Reprobe"): consult Heal History for
/// top-n learned strategies for `(element, url_pattern)`, set them as
/// the `preferred_strategies` hint, and re-run Discovery.
pub async fn reprobe(
    driver: &dyn BrowserDriver,
    step: &Step,
    url_pattern: &str,
    failing_selector: Option<&str>,
    heal_history: &HealHistory,
    config: &EngineConfig,
) -> Result<(ReprobeOutcome, Vec<String>), DiscoveryError> {
    const TOP_N: usize = 3;
    let learned_names = heal_history
        .get_best_strategy(&step.element_label, url_pattern, TOP_N)
        .await;
    let preferred_strategies: Vec<Strategy> = learned_names
        .iter()
        .filter_map(|name| Strategy::from_name(name))
        .collect();

    let mut intent = Intent::from(step);
    intent.preferred_strategies = preferred_strategies.clone();

    let result = discover(driver, &intent, config).await?;

    let outcome = match result {
        Some(result) if Some(result.selector.as_str()) == failing_selector => {
            ReprobeOutcome::NoProgressSameSelector
        }
        Some(result) => ReprobeOutcome::NewSelector(result),
        None => ReprobeOutcome::DiscoveryFailed,
    };
    Ok((outcome, learned_names))
}
