//! The Discovery Engine (C4, §4.4): turns an `Intent` into a selector by
//! running an 8-tier strategy cascade behind region scoping, an override
//! bypass, and a per-call timeout.

mod candidates;
mod cascade;
mod errors;
mod fuzzy;
pub mod region;
mod types;

pub use errors::DiscoveryError;
pub use region::resolve_region;
pub use types::{DiscoveryResult, Intent, Strategy};

use std::time::Duration;

use soulbrowser_browser_driver::{BrowserDriver, ElementHandle, LoadState};
use soulbrowser_core_types::{EngineConfig, ReadinessProfile};
use tracing::{info, instrument};

const SETTLE_DELAY_MS: u64 = 150;

/// `css:` and `role:` prefixes recognized by the override bypass
/// (§4.4 "Override anchors"). An override is never discovered through
/// the cascade and is never cached (`Strategy::Override::stable() ==
/// false`).
#[derive(Clone, Debug)]
enum OverrideAnchor {
    Css(String),
    Role { role: String, name: String },
}

fn parse_override(element_type_hint: &str) -> Result<Option<OverrideAnchor>, DiscoveryError> {
    if let Some(css) = element_type_hint.strip_prefix("css:") {
        return Ok(Some(OverrideAnchor::Css(css.to_string())));
    }
    if let Some(rest) = element_type_hint.strip_prefix("role:") {
        let (role, name) = rest.split_once('=').ok_or_else(|| {
            DiscoveryError::InvalidOverride(format!(
                "role override '{element_type_hint}' missing '=name'"
            ))
        })?;
        let name = name.trim_matches('"').to_string();
        return Ok(Some(OverrideAnchor::Role {
            role: role.to_string(),
            name,
        }));
    }
    Ok(None)
}

async fn resolve_override(
    driver: &dyn BrowserDriver,
    anchor: OverrideAnchor,
) -> Result<DiscoveryResult, DiscoveryError> {
    let selector = match &anchor {
        OverrideAnchor::Css(css) => css.clone(),
        OverrideAnchor::Role { role, name } => format!("role={role}[name=\"{name}\"]"),
    };
    let hit = driver.query(&selector).await?;
    if hit.is_none() {
        return Err(DiscoveryError::InvalidOverride(format!(
            "override anchor '{selector}' matched nothing"
        )));
    }
    let (score, _) = Strategy::Override.score_range();
    Ok(DiscoveryResult {
        selector,
        score,
        strategy: Strategy::Override,
        stable: false,
        warning: None,
    })
}

/// Wait for the page to settle before the cascade runs (§4.4
/// "pre-stabilization"): a `domcontentloaded` wait plus a fixed settle
/// delay, and — unless the caller's readiness profile says the page is
/// static — a brief extra wait for network idle.
async fn pre_stabilize(
    driver: &dyn BrowserDriver,
    config: &EngineConfig,
) -> Result<(), DiscoveryError> {
    driver
        .wait_for_load_state(LoadState::DomContentLoaded, 5_000)
        .await?;

    let wants_network_idle = !matches!(config.profile_override, Some(ReadinessProfile::Static));
    if wants_network_idle {
        // Best-effort: a stubborn long-poll page should not block
        // discovery forever, so faults here are swallowed rather than
        // propagated.
        let _ = driver
            .wait_for_load_state(LoadState::NetworkIdle, 3_000)
            .await;
    }

    tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;
    Ok(())
}

/// Run discovery for one [`Intent`] (§4.4 end to end): override bypass,
/// then region resolution, pre-stabilization, and the tier cascade, all
/// wrapped in the configured per-call timeout.
#[instrument(skip(driver, config), fields(label = %intent.element_label, action = ?intent.action))]
pub async fn discover(
    driver: &dyn BrowserDriver,
    intent: &Intent,
    config: &EngineConfig,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    let timeout = Duration::from_secs(config.discovery_per_call_timeout_seconds);
    let outcome = tokio::time::timeout(timeout, run(driver, intent, config)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(DiscoveryError::Timeout(timeout.as_millis() as u64)),
    }
}

async fn run(
    driver: &dyn BrowserDriver,
    intent: &Intent,
    config: &EngineConfig,
) -> Result<Option<DiscoveryResult>, DiscoveryError> {
    if let Some(hint) = &intent.element_type_hint {
        if let Some(anchor) = parse_override(hint)? {
            let result = resolve_override(driver, anchor).await?;
            info!(selector = %result.selector, "override anchor resolved");
            return Ok(Some(result));
        }
    }

    let (container, region_warning) = region::resolve_region(driver, intent.region.as_deref()).await;
    if let Some(warning) = region_warning {
        info!("{}", warning);
    }

    pre_stabilize(driver, config).await?;

    let handle_ref: Option<&ElementHandle> = container.as_ref();
    let result = cascade::run_cascade(driver, intent, handle_ref).await?;
    if let Some(result) = &result {
        info!(
            strategy = result.strategy.name(),
            selector = %result.selector,
            score = result.score,
            "discovery resolved"
        );
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_browser_driver::mock::{MockDriver, MockElement};
    use soulbrowser_core_types::Action;

    fn intent(label: &str, action: Action) -> Intent {
        Intent {
            element_label: label.to_string(),
            action,
            value: None,
            region: None,
            ordinal: None,
            element_type_hint: None,
            preferred_strategies: Vec::new(),
        }
    }

    #[tokio::test]
    async fn resolves_via_aria_label_tier() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("e1", "input").with_attr("aria-label", "Username")],
        );

        let result = discover(&driver, &intent("Username", Action::Fill), &EngineConfig::default())
            .await
            .unwrap()
            .expect("expected a hit");
        assert_eq!(result.strategy, Strategy::AriaLabel);
    }

    #[tokio::test]
    async fn falls_back_through_tiers_to_id_class() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("submit-button", "button")
                .with_attr("class", "submit-button primary")],
        );

        let result = discover(&driver, &intent("Submit", Action::Click), &EngineConfig::default())
            .await
            .unwrap()
            .expect("expected a hit");
        assert_eq!(result.strategy, Strategy::IdClass);
    }

    #[tokio::test]
    async fn override_bypasses_the_cascade() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("e1", "button").with_attr("aria-label", "irrelevant")],
        );

        let mut it = intent("anything", Action::Click);
        it.element_type_hint = Some("css:#e1".to_string());
        let result = discover(&driver, &it, &EngineConfig::default())
            .await
            .unwrap()
            .expect("expected a hit");
        assert_eq!(result.strategy, Strategy::Override);
        assert_eq!(result.selector, "#e1");
    }

    #[tokio::test]
    async fn preferred_strategies_hint_reorders_the_cascade() {
        // Both a data-test-hook (tier 7) and an aria-label (tier 1)
        // resolve the same label; plain cascade order would pick
        // aria-label first, but a healer-supplied prior for
        // data-test-hook should win instead.
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("e1", "input")
                .with_attr("aria-label", "Username")
                .with_attr("data-testid", "Username")],
        );

        let mut it = intent("Username", Action::Fill);
        it.preferred_strategies = vec![Strategy::DataTestHook];
        let result = discover(&driver, &it, &EngineConfig::default())
            .await
            .unwrap()
            .expect("expected a hit");
        assert_eq!(result.strategy, Strategy::DataTestHook);
    }

    #[tokio::test]
    async fn missing_label_returns_none() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let result = discover(&driver, &intent("Nonexistent", Action::Click), &EngineConfig::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
