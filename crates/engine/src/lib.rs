//! The engine: the single entry point a consumer links against. Wires
//! the selector cache, heal history, and telemetry into one
//! [`Orchestrator`] and exposes `run_test_spec` as the one call a host
//! application needs (§6 EXTERNAL INTERFACES).
//!
//! Everything here is in-process, in-memory wiring — a host that wants
//! durable stores across process restarts constructs its own
//! `DurableCacheStore`/`HealHistoryStore` implementations and reaches
//! for `soulbrowser-orchestrator::Orchestrator` directly instead of
//! this convenience wrapper.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{
    EngineConfig, ExecutionRecord, HealEvent, RunId, TestSpec, Verdict,
};
use soulbrowser_heal_history::HealHistory;
use soulbrowser_orchestrator::{CancelSignal, Orchestrator};
use soulbrowser_selector_cache::SelectorCache;
use soulbrowser_telemetry::{Telemetry, TelemetrySnapshot};
pub use soulbrowser_selector_cache::SessionContext;

/// Everything a caller wants back from one run (§6 "Emitted run log"):
/// the verdict, every per-step record, every heal attempt, and a
/// telemetry snapshot taken immediately after the run finished.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunLog {
    pub req_id: RunId,
    pub verdict: Verdict,
    pub executed_steps: Vec<ExecutionRecord>,
    pub heal_events: Vec<HealEvent>,
    pub telemetry: TelemetrySnapshot,
}

/// The wired-up engine: one [`SelectorCache`], one [`HealHistory`],
/// one [`Telemetry`] instance, and the [`Orchestrator`] built from
/// them. Cheap to clone; intended to live for the process's lifetime
/// and be shared across concurrent runs (§5 "Concurrency model":
/// "Cross-run concurrency is explicitly supported").
#[derive(Clone)]
pub struct Engine {
    orchestrator: Orchestrator,
    telemetry: Arc<Telemetry>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let telemetry = Arc::new(Telemetry::new());
        let cache = Arc::new(SelectorCache::new(config, Arc::clone(&telemetry)));
        let heal_history = Arc::new(HealHistory::new());
        let orchestrator = Orchestrator::new(config, cache, heal_history, Arc::clone(&telemetry));
        Self {
            orchestrator,
            telemetry,
        }
    }

    /// Build an engine from the process environment (§6 Configuration),
    /// reading the six recognized options once.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Run one [`TestSpec`] to completion against `driver` and return
    /// its [`RunLog`]. A spec whose last step is `action=wait` and is
    /// never resumed returns with `verdict=None` collapsed to
    /// `Verdict::Partial`, since [`RunLog::verdict`] is not optional —
    /// callers that need to support human-in-the-loop steps should use
    /// [`Engine::run_interactive`] instead.
    pub async fn run_test_spec(
        &self,
        driver: &dyn BrowserDriver,
        spec: TestSpec,
        session: &SessionContext,
    ) -> RunLog {
        let run = self
            .orchestrator
            .run(driver, spec.steps, session)
            .await;
        RunLog {
            req_id: run.req_id,
            verdict: run.verdict.unwrap_or(Verdict::Partial),
            executed_steps: run.executed_steps,
            heal_events: run.heal_events,
            telemetry: self.telemetry(),
        }
    }

    /// Like [`Engine::run_test_spec`], but cooperatively cancellable
    /// (§5 "Cancellation and timeouts") via the returned
    /// [`CancelSignal`]'s clone kept by the caller.
    pub async fn run_test_spec_cancellable(
        &self,
        driver: &dyn BrowserDriver,
        spec: TestSpec,
        session: &SessionContext,
        cancel: &CancelSignal,
    ) -> RunLog {
        let run = self
            .orchestrator
            .run_with_cancellation(driver, spec.steps, session, cancel)
            .await;
        RunLog {
            req_id: run.req_id,
            verdict: run.verdict.unwrap_or(Verdict::Partial),
            executed_steps: run.executed_steps,
            heal_events: run.heal_events,
            telemetry: self.telemetry(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_browser_driver::mock::{MockDriver, MockElement};
    use soulbrowser_core_types::{Action, Step};

    #[tokio::test]
    async fn runs_a_spec_end_to_end_and_reports_pass() {
        let driver = MockDriver::new(
            "https://example.com/login",
            vec![
                MockElement::new("u1", "input").with_attr("aria-label", "Username"),
                MockElement::new("p1", "input").with_attr("aria-label", "Password"),
                MockElement::new("b1", "button").with_attr("aria-label", "Log in"),
            ],
        );
        let spec = TestSpec::new(
            "req-1",
            "https://example.com/login",
            vec![
                Step::new("u1", "Username", Action::Fill).with_value("u"),
                Step::new("p1", "Password", Action::Fill).with_value("p"),
                Step::new("b1", "Log in", Action::Click),
            ],
        );
        let session = SessionContext::new("example.com", "/login").with_session_epoch(1);

        let engine = Engine::new(EngineConfig::default());
        let log = engine.run_test_spec(&driver, spec, &session).await;

        assert_eq!(log.verdict, Verdict::Pass);
        assert_eq!(log.executed_steps.len(), 3);
        assert!(log.heal_events.is_empty());
        assert_eq!(log.telemetry.runs_created, 1);
        assert_eq!(log.telemetry.runs_passed, 1);
    }

    #[tokio::test]
    async fn cancellation_yields_partial_verdict_in_the_run_log() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![MockElement::new("a", "button").with_attr("aria-label", "A")],
        );
        let spec = TestSpec::new(
            "req-2",
            "https://example.com",
            vec![Step::new("a", "A", Action::Click)],
        );
        let session = SessionContext::new("example.com", "/");

        let engine = Engine::new(EngineConfig::default());
        let cancel = CancelSignal::new();
        cancel.cancel();
        let log = engine
            .run_test_spec_cancellable(&driver, spec, &session, &cancel)
            .await;

        assert_eq!(log.verdict, Verdict::Partial);
    }
}
