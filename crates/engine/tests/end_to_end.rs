//! Scenario-level coverage of the six reference fixtures the engine is
//! expected to pass end to end, driven entirely against [`MockDriver`]
//! since no real browser is available here.

use soulbrowser_browser_driver::mock::{MockCall, MockDriver, MockElement};
use soulbrowser_core_types::{Action, DiscoverySource, EngineConfig, Step, TestSpec, Verdict};
use soulbrowser_engine::{Engine, SessionContext};

fn login_spec(req_id: &str) -> TestSpec {
    TestSpec::new(
        req_id,
        "https://example.com/login",
        vec![
            Step::new("u1", "Username", Action::Fill).with_value("u"),
            Step::new("p1", "Password", Action::Fill).with_value("p"),
            Step::new("b1", "Log in", Action::Click),
        ],
    )
}

fn login_elements() -> Vec<MockElement> {
    vec![
        MockElement::new("u1", "input").with_attr("aria-label", "Username"),
        MockElement::new("p1", "input").with_attr("aria-label", "Password"),
        MockElement::new("b1", "button").with_attr("aria-label", "Log in"),
    ]
}

/// Scenario 1: static login, every selector stable on the first try.
#[tokio::test]
async fn static_login_all_stable_selectors() {
    let driver = MockDriver::new("https://example.com/login", login_elements());
    let session = SessionContext::new("example.com", "/login").with_session_epoch(1);
    let engine = Engine::new(EngineConfig::default());

    let log = engine.run_test_spec(&driver, login_spec("req-1"), &session).await;

    assert_eq!(log.verdict, Verdict::Pass);
    assert_eq!(log.executed_steps.len(), 3);
    assert!(log.heal_events.is_empty());
    assert!(log
        .executed_steps
        .iter()
        .all(|r| r.discovery_source == DiscoverySource::Fresh));
}

/// Scenario 2: re-running the same spec against the same URL and
/// session is served entirely from the cache.
#[tokio::test]
async fn cache_warmth_across_two_runs() {
    let driver = MockDriver::new("https://example.com/login", login_elements());
    let session = SessionContext::new("example.com", "/login").with_session_epoch(1);
    let engine = Engine::new(EngineConfig::default());

    let first = engine.run_test_spec(&driver, login_spec("req-2a"), &session).await;
    assert_eq!(first.verdict, Verdict::Pass);

    let second = engine.run_test_spec(&driver, login_spec("req-2b"), &session).await;
    assert_eq!(second.verdict, Verdict::Pass);
    assert!(second.executed_steps.iter().all(|r| matches!(
        r.discovery_source,
        DiscoverySource::SessionCache | DiscoverySource::DurableCache
    )));
    assert_eq!(second.telemetry.cache_hit_fast + second.telemetry.cache_hit_durable, 3);
}

/// Scenario 3: a structurally different page (skeleton distance well
/// past the 35% default threshold) invalidates the warm cache entries
/// and forces re-discovery, but the run still passes.
#[tokio::test]
async fn drift_invalidates_the_cache_and_still_passes() {
    let driver = MockDriver::new("https://example.com/login", login_elements());
    let session = SessionContext::new("example.com", "/login").with_session_epoch(1);
    let engine = Engine::new(EngineConfig::default());

    let first = engine.run_test_spec(&driver, login_spec("req-3a"), &session).await;
    assert_eq!(first.verdict, Verdict::Pass);

    // Six extra nodes appended to the DOM skeleton; ~97% SHA-1 hex
    // distance from the original three-element skeleton, far past the
    // 35% default drift threshold.
    for i in 0..6 {
        driver.replace_element(
            &format!("never-existed-{i}"),
            MockElement::new(format!("filler-{i}"), "div"),
        );
    }

    let second = engine.run_test_spec(&driver, login_spec("req-3b"), &session).await;
    assert_eq!(second.verdict, Verdict::Pass);
    assert!(second.telemetry.drift_detected >= 1);
    assert!(second.telemetry.cache_invalidated >= 1);
    assert!(second
        .executed_steps
        .iter()
        .any(|r| r.discovery_source == DiscoverySource::Fresh));
}

/// Scenario 4: a target below the fold fails the gate's visibility
/// check, the Healer's reveal step scrolls it into view, and the
/// re-gate then passes.
#[tokio::test]
async fn healed_not_visible_via_scroll_into_view() {
    let driver = MockDriver::new(
        "https://example.com",
        vec![MockElement::new("submit", "button")
            .with_attr("aria-label", "Submit")
            .hidden()],
    );
    driver.reveal_on_scroll("submit");

    let spec = TestSpec::new(
        "req-4",
        "https://example.com",
        vec![Step::new("submit", "Submit", Action::Click)],
    );
    let session = SessionContext::new("example.com", "/");
    let engine = Engine::new(EngineConfig::default());

    let log = engine.run_test_spec(&driver, spec, &session).await;

    assert_eq!(log.verdict, Verdict::Pass);
    assert_eq!(log.heal_events.len(), 1);
    assert_eq!(log.heal_events[0].round, 1);
    assert!(log.heal_events[0]
        .actions
        .iter()
        .any(|a| a == "scroll_into_view"));
    assert!(log.heal_events[0].success);
}

/// Scenario 5: no matching element exists at all; every heal round is
/// exhausted without progress and the run terminates `fail`.
#[tokio::test]
async fn heal_budget_exhaustion_terminates_the_run_as_failed() {
    let driver = MockDriver::new("https://example.com", vec![]);
    let spec = TestSpec::new(
        "req-5",
        "https://example.com",
        vec![Step::new("ghost", "NonExistent", Action::Click)],
    );
    let session = SessionContext::new("example.com", "/");
    let config = EngineConfig::default();
    let engine = Engine::new(config);

    let log = engine.run_test_spec(&driver, spec, &session).await;

    assert_eq!(log.verdict, Verdict::Fail);
    assert_eq!(log.heal_events.len(), config.max_heal_rounds as usize);
    assert!(log.heal_events.iter().all(|e| !e.success));
    assert!(log.executed_steps.is_empty());
}

/// Scenario 6: filling a search box triggers the page to swap in a
/// replacement DOM node; the subsequent press on the same label still
/// resolves (by selector, not by the now-stale handle) and takes the
/// press-after-fill fast path rather than falling into the Healer.
#[tokio::test]
async fn press_after_fill_survives_element_replacement() {
    let driver = MockDriver::new(
        "https://example.com",
        vec![MockElement::new("search", "input").with_attr("aria-label", "Search")],
    );
    driver.replace_on_fill(
        "search",
        MockElement::new("search-2", "input").with_attr("aria-label", "Search"),
    );

    let spec = TestSpec::new(
        "req-6",
        "https://example.com",
        vec![
            Step::new("search", "Search", Action::Fill).with_value("x"),
            Step::new("search", "Search", Action::Press).with_value("Enter"),
        ],
    );
    let session = SessionContext::new("example.com", "/");
    let engine = Engine::new(EngineConfig::default());

    let log = engine.run_test_spec(&driver, spec, &session).await;

    assert_eq!(log.verdict, Verdict::Pass);
    assert_eq!(log.executed_steps.len(), 2);
    assert!(log.heal_events.is_empty());
    assert!(driver
        .calls()
        .iter()
        .any(|c| matches!(c, MockCall::PressOn(id, key) if id == "search-2" && key == "Enter")));
}
