use soulbrowser_browser_driver::{BrowserDriver, ElementHandle};
use tracing::debug;

use crate::candidates::{finalize, Finalized};
use crate::errors::DiscoveryError;
use crate::fuzzy::{fuzzy_match, normalize_label};
use crate::types::{DiscoveryResult, Intent, Strategy};

fn attr_names_for(strategy: Strategy) -> &'static [&'static str] {
    match strategy {
        Strategy::AriaLabel => &["aria-label"],
        Strategy::AriaPlaceholder => &["aria-placeholder"],
        Strategy::Name => &["name"],
        Strategy::Placeholder => &["placeholder"],
        Strategy::DataTestHook => &["data-testid", "data-test", "data-qa", "data-cy", "data-automation"],
        _ => &[],
    }
}

/// Tiers 1-4 and 7 share one shape: an exact `[attr="label"]` lookup,
/// falling back to a fuzzy scan of every element carrying the
/// attribute at all (§4.4 "each tier is tried with exact-then-fuzzy
/// matching").
async fn attr_tier(
    driver: &dyn BrowserDriver,
    strategy: Strategy,
    intent: &Intent,
    container: Option<&ElementHandle>,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    let normalized = normalize_label(&intent.element_label);

    for attr in attr_names_for(strategy) {
        let exact_selector = format!("[{attr}=\"{}\"]", intent.element_label);
        let raw = driver.query_all(&exact_selector).await?;
        match finalize(driver, raw, intent, container).await? {
            Finalized::One(_) => {
                let (_, max) = strategy.score_range();
                debug!(strategy = strategy.name(), selector = %exact_selector, "exact tier hit");
                return Ok(Some(DiscoveryResult {
                    selector: exact_selector,
                    score: max,
                    strategy,
                    stable: strategy.stable(),
                    warning: None,
                }));
            }
            Finalized::None | Finalized::Many(_) => {}
        }

        let presence_selector = format!("[{attr}]");
        let raw = driver.query_all(&presence_selector).await?;
        let mut fuzzy_hits = Vec::new();
        for handle in raw {
            if let Some(value) = driver.attribute(&handle, attr).await? {
                if fuzzy_match(&normalized, &value, intent.action) {
                    fuzzy_hits.push((handle, value));
                }
            }
        }
        let handles: Vec<ElementHandle> = fuzzy_hits.iter().map(|(h, _)| h.clone()).collect();
        if let Finalized::One(handle) = finalize(driver, handles, intent, container).await? {
            let value = fuzzy_hits
                .into_iter()
                .find(|(h, _)| h.0 == handle.0)
                .map(|(_, v)| v)
                .unwrap_or_default();
            let (min, _) = strategy.score_range();
            let selector = format!("[{attr}=\"{value}\"]");
            debug!(strategy = strategy.name(), selector = %selector, "fuzzy tier hit");
            return Ok(Some(DiscoveryResult {
                selector,
                score: min,
                strategy,
                stable: strategy.stable(),
                warning: None,
            }));
        }
    }

    Ok(None)
}

/// Tier 5: `label[for]` proximity — find a `<label>` whose text matches
/// the element label exactly (the mock driver's `:has-text()` selector
/// is the only text-content probe the capability interface exposes),
/// follow its `for` attribute to the target input.
async fn label_for_tier(
    driver: &dyn BrowserDriver,
    intent: &Intent,
    container: Option<&ElementHandle>,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    let label_selector = format!("label:has-text(\"{}\")", intent.element_label);
    let labels = driver.query_all(&label_selector).await?;
    for label_handle in labels {
        let Some(target_id) = driver.attribute(&label_handle, "for").await? else {
            continue;
        };
        let selector = format!("#{target_id}");
        let raw = driver.query_all(&selector).await?;
        if let Finalized::One(_) = finalize(driver, raw, intent, container).await? {
            let (score, _) = Strategy::LabelFor.score_range();
            return Ok(Some(DiscoveryResult {
                selector,
                score,
                strategy: Strategy::LabelFor,
                stable: true,
                warning: None,
            }));
        }
    }
    Ok(None)
}

fn candidate_roles_for(action: soulbrowser_core_types::Action) -> &'static [&'static str] {
    use soulbrowser_core_types::Action::*;
    match action {
        Click => &["button", "link", "menuitem"],
        Fill | Type => &["textbox", "searchbox"],
        Select => &["combobox", "listbox"],
        Check | Uncheck => &["checkbox"],
        Hover | Focus => &["button", "link"],
        Press => &["button"],
        Wait | Navigate => &[],
    }
}

/// A candidate is rejected from tier-6 disambiguation when it looks
/// like chrome around the real target (§4.4 "(b) structural filters
/// rejecting candidates inside tab strips or marked close/remove").
fn looks_like_chrome(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("tab") || lower.contains("close") || lower.contains("remove")
}

/// Tier 6: role + accessible-name, with the three-step disambiguation
/// ladder when more than one candidate matches (§4.4).
async fn role_name_tier(
    driver: &dyn BrowserDriver,
    intent: &Intent,
    container: Option<&ElementHandle>,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    for role in candidate_roles_for(intent.action) {
        let selector = format!("role={role}[name=\"{}\"]", intent.element_label);
        let raw = driver.query_all(&selector).await?;
        match finalize(driver, raw, intent, container).await? {
            Finalized::One(_) => {
                let (_, max) = Strategy::RoleName.score_range();
                return Ok(Some(DiscoveryResult {
                    selector,
                    score: max,
                    strategy: Strategy::RoleName,
                    stable: false,
                    warning: None,
                }));
            }
            Finalized::None => continue,
            Finalized::Many(candidates) => {
                // (a) a tighter has-text locator.
                let tight = format!("{selector}:has-text(\"{}\")", intent.element_label);
                let raw = driver.query_all(&tight).await?;
                if let Finalized::One(_) = finalize(driver, raw, intent, container).await? {
                    let (_, max) = Strategy::RoleName.score_range();
                    return Ok(Some(DiscoveryResult {
                        selector: tight,
                        score: max,
                        strategy: Strategy::RoleName,
                        stable: false,
                        warning: None,
                    }));
                }

                // (b) reject chrome-looking candidates (tab strips,
                // close/remove controls).
                let mut filtered = Vec::new();
                for handle in &candidates {
                    let name = driver
                        .attribute(handle, "aria-label")
                        .await?
                        .unwrap_or_default();
                    if !looks_like_chrome(&name) {
                        filtered.push(handle.clone());
                    }
                }
                if filtered.len() == 1 {
                    let (_, max) = Strategy::RoleName.score_range();
                    return Ok(Some(DiscoveryResult {
                        selector,
                        score: max,
                        strategy: Strategy::RoleName,
                        stable: false,
                        warning: None,
                    }));
                }

                // (c) last resort: positional nth=0, lowered score,
                // flagged non-unique.
                let (min, _) = Strategy::RoleName.score_range();
                let positional = format!("{selector}:nth(0)");
                return Ok(Some(DiscoveryResult {
                    selector: positional,
                    score: (min - 0.1).max(0.0),
                    strategy: Strategy::RoleName,
                    stable: false,
                    warning: Some("non_unique".to_string()),
                }));
            }
        }
    }
    Ok(None)
}

/// Tier 8, last resort: fuzzy-match the element's own `id`/class tokens
/// against the normalized label across every element on the page.
async fn id_class_tier(
    driver: &dyn BrowserDriver,
    intent: &Intent,
    container: Option<&ElementHandle>,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    let normalized = normalize_label(&intent.element_label);
    let all = driver.query_all("*").await?;
    let mut hits = Vec::new();
    for handle in all {
        let class = driver.attribute(&handle, "class").await?.unwrap_or_default();
        if fuzzy_match(&normalized, &handle.0, intent.action)
            || fuzzy_match(&normalized, &class, intent.action)
        {
            hits.push(handle);
        }
    }
    if let Finalized::One(handle) = finalize(driver, hits, intent, container).await? {
        let (min, _) = Strategy::IdClass.score_range();
        let selector = format!("#{}", handle.0);
        return Ok(Some(DiscoveryResult {
            selector,
            score: min,
            strategy: Strategy::IdClass,
            stable: false,
            warning: None,
        }));
    }
    Ok(None)
}

/// Reorder the cascade so any tier named in `intent.preferred_strategies`
/// (the Healer's learned-priors hint, §4.7 step 2) is tried first, in
/// the order given, ahead of the remaining tiers in their usual order.
/// An empty hint is a no-op: this returns the plain cascade order.
fn ordered_cascade(intent: &Intent) -> Vec<Strategy> {
    let order = Strategy::cascade_order();
    if intent.preferred_strategies.is_empty() {
        return order.to_vec();
    }

    let mut preferred = Vec::new();
    for strategy in &intent.preferred_strategies {
        if order.contains(strategy) && !preferred.contains(strategy) {
            preferred.push(*strategy);
        }
    }
    let mut rest: Vec<Strategy> = order.into_iter().filter(|s| !preferred.contains(s)).collect();
    preferred.append(&mut rest);
    preferred
}

/// Run the tier 1-8 cascade in order, returning the first stable hit
/// (§4.4 "first stable hit wins"). `stable` here describes the tier,
/// not a post-hoc check — tiers 6 and 8 never claim stability. When the
/// intent carries a `preferred_strategies` hint the cascade is tried in
/// that order first (§4.7 "Reprobe").
pub async fn run_cascade(
    driver: &dyn BrowserDriver,
    intent: &Intent,
    container: Option<&ElementHandle>,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    for strategy in ordered_cascade(intent) {
        let result = match strategy {
            Strategy::AriaLabel
            | Strategy::AriaPlaceholder
            | Strategy::Name
            | Strategy::Placeholder
            | Strategy::DataTestHook => attr_tier(driver, strategy, intent, container).await?,
            Strategy::LabelFor => label_for_tier(driver, intent, container).await?,
            Strategy::RoleName => role_name_tier(driver, intent, container).await?,
            Strategy::IdClass => id_class_tier(driver, intent, container).await?,
            Strategy::Override => None,
        };
        if result.is_some() {
            return Ok(result);
        }
    }
    Ok(None)
}
