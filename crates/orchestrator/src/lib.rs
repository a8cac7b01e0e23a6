//! The Orchestrator (C8, §4.8): the execution graph's state machine,
//! routing each step across Discovery (C4), the Gate (C5), the
//! Executor (C6), and the Healer (C7), tracking `step_idx` and the
//! final `verdict`.
//!
//! [`Orchestrator`] owns no mutable state of its own beyond the shared
//! cache/heal-history/telemetry handles it was built with; the
//! single-writer [`soulbrowser_core_types::RunState`] it drives is
//! supplied by the caller and is the only thing any state mutates
//! (§5 "there is no shared mutable state inside a run other than the
//! RunState, which only the Orchestrator mutates").

mod cancel;
mod discover;
mod dom_hash;
mod errors;
mod gate_execute;
mod heal;
mod state;
mod verdict;

pub use cancel::CancelSignal;
pub use errors::OrchestratorError;
pub use state::OrchState;
pub use verdict::compute_verdict;

use std::sync::Arc;

use soulbrowser_browser_driver::BrowserDriver;
use soulbrowser_core_types::{plan_for_steps, EngineConfig, RunId, RunState, Step, Verdict};
use soulbrowser_executor::ExecutorConfig;
use soulbrowser_healer::HealerConfig;
use soulbrowser_heal_history::HealHistory;
use soulbrowser_selector_cache::{SelectorCache, SessionContext};
use soulbrowser_telemetry::Telemetry;
use tracing::info;

/// The Orchestrator: an immutable bundle of the shared collaborators
/// every state needs (cache, heal history, telemetry, the two
/// subsystem-specific opaque configs) plus the engine-wide
/// [`EngineConfig`]. Cheap to clone — everything inside is an `Arc` or
/// `Copy`.
#[derive(Clone)]
pub struct Orchestrator {
    config: EngineConfig,
    cache: Arc<SelectorCache>,
    heal_history: Arc<HealHistory>,
    telemetry: Arc<Telemetry>,
    executor_config: ExecutorConfig,
    healer_config: HealerConfig,
}

impl Orchestrator {
    pub fn new(
        config: EngineConfig,
        cache: Arc<SelectorCache>,
        heal_history: Arc<HealHistory>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            config,
            cache,
            heal_history,
            telemetry,
            executor_config: ExecutorConfig::default(),
            healer_config: HealerConfig::default(),
        }
    }

    pub fn with_configs(
        mut self,
        executor_config: ExecutorConfig,
        healer_config: HealerConfig,
    ) -> Self {
        self.executor_config = executor_config;
        self.healer_config = healer_config;
        self
    }

    /// Build a fresh [`RunState`] for `steps` and drive it to
    /// completion or to `AWAIT_HUMAN` (§4.8 `INIT` as the initial
    /// state). Callers whose spec never uses `action=wait` get a
    /// finished run back directly; callers who need to support it
    /// should inspect [`RunState::context`] for the `awaiting_human`
    /// marker and call [`Orchestrator::resume`] once the human signal
    /// arrives.
    pub async fn run(
        &self,
        driver: &dyn BrowserDriver,
        steps: Vec<Step>,
        session: &SessionContext,
    ) -> RunState {
        self.run_with_cancellation(driver, steps, session, &CancelSignal::new())
            .await
    }

    pub async fn run_with_cancellation(
        &self,
        driver: &dyn BrowserDriver,
        steps: Vec<Step>,
        session: &SessionContext,
        cancel: &CancelSignal,
    ) -> RunState {
        let plan = plan_for_steps(&steps);
        let mut run = RunState::new(RunId::new(), plan);
        self.telemetry.record_runs_created();
        self.drive(driver, &mut run, session, cancel).await;
        run
    }

    /// Resume a run left at `AWAIT_HUMAN` (§4.8 `AWAIT_HUMAN → INIT
    /// (resume signal)`, B2 "advances step_idx on resume").
    pub async fn resume(
        &self,
        driver: &dyn BrowserDriver,
        run: &mut RunState,
        session: &SessionContext,
    ) -> OrchState {
        self.resume_with_cancellation(driver, run, session, &CancelSignal::new())
            .await
    }

    pub async fn resume_with_cancellation(
        &self,
        driver: &dyn BrowserDriver,
        run: &mut RunState,
        session: &SessionContext,
        cancel: &CancelSignal,
    ) -> OrchState {
        run.context.remove("awaiting_human");
        run.step_idx += 1;
        run.heal_round = 0;
        self.drive(driver, run, session, cancel).await
    }

    /// Loop the FSM (§4.8 transition table) until `DONE` or
    /// `AWAIT_HUMAN`. Finalizes `run.verdict` when it returns `DONE`;
    /// leaves it `None` on `AWAIT_HUMAN` since the run isn't over yet.
    async fn drive(
        &self,
        driver: &dyn BrowserDriver,
        run: &mut RunState,
        session: &SessionContext,
        cancel: &CancelSignal,
    ) -> OrchState {
        let mut state = OrchState::Init;
        loop {
            if cancel.is_cancelled() && state != OrchState::Done && state != OrchState::AwaitHuman {
                state = OrchState::Done;
            }

            state = match state {
                OrchState::Init => {
                    if run.is_done() {
                        OrchState::Done
                    } else {
                        OrchState::Discover
                    }
                }
                OrchState::Discover => {
                    discover::on_discover(
                        driver,
                        run,
                        &self.cache,
                        &self.config,
                        &self.telemetry,
                        session,
                    )
                    .await
                }
                OrchState::GateAndExecute => {
                    gate_execute::on_gate_and_execute(driver, run, &self.executor_config).await
                }
                OrchState::Heal => {
                    heal::on_heal(
                        driver,
                        run,
                        &self.cache,
                        &self.heal_history,
                        &self.telemetry,
                        &self.config,
                        &self.healer_config,
                        session,
                    )
                    .await
                }
                OrchState::AwaitHuman => {
                    return OrchState::AwaitHuman;
                }
                OrchState::Done => {
                    let verdict = compute_verdict(run, self.config.max_heal_rounds, cancel.is_cancelled());
                    run.verdict = Some(verdict);
                    for _ in 0..run.executed_steps.len() {
                        self.telemetry.record_steps_executed();
                    }
                    match verdict {
                        Verdict::Pass => self.telemetry.record_runs_passed(),
                        Verdict::Fail | Verdict::Blocked => self.telemetry.record_runs_failed(),
                        Verdict::Partial => {}
                    }
                    info!(req_id = %run.req_id, ?verdict, step_idx = run.step_idx, "run complete");
                    return OrchState::Done;
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_browser_driver::mock::{MockDriver, MockElement};
    use soulbrowser_core_types::{Action, Verdict};

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            EngineConfig::default(),
            Arc::new(SelectorCache::new(EngineConfig::default(), Arc::new(Telemetry::new()))),
            Arc::new(HealHistory::new()),
            Arc::new(Telemetry::new()),
        )
    }

    fn session() -> SessionContext {
        SessionContext::new("example.com", "/login").with_session_epoch(1)
    }

    #[tokio::test]
    async fn static_login_all_stable_selectors_passes_with_no_heals() {
        let driver = MockDriver::new(
            "https://example.com/login",
            vec![
                MockElement::new("u1", "input").with_attr("aria-label", "Username"),
                MockElement::new("p1", "input").with_attr("aria-label", "Password"),
                MockElement::new("b1", "button").with_attr("aria-label", "Log in"),
            ],
        );
        let steps = vec![
            Step::new("u1", "Username", Action::Fill).with_value("u"),
            Step::new("p1", "Password", Action::Fill).with_value("p"),
            Step::new("b1", "Log in", Action::Click),
        ];

        let orch = orchestrator();
        let run = orch.run(&driver, steps, &session()).await;

        assert_eq!(run.verdict, Some(Verdict::Pass));
        assert_eq!(run.executed_steps.len(), 3);
        assert!(run.heal_events.is_empty());
    }

    #[tokio::test]
    async fn heal_budget_exhaustion_yields_fail_verdict() {
        let driver = MockDriver::new("https://example.com/login", vec![]);
        let steps = vec![Step::new("ghost", "NonExistent", Action::Click)];

        let orch = orchestrator();
        let run = orch.run(&driver, steps, &session()).await;

        assert_eq!(run.verdict, Some(Verdict::Fail));
        assert_eq!(run.step_idx, 0);
        assert_eq!(run.heal_events.len(), EngineConfig::default().max_heal_rounds as usize);
        assert!(run.heal_events.iter().all(|e| !e.success));
    }

    #[tokio::test]
    async fn blocked_signal_supersedes_pass() {
        let driver = MockDriver::new(
            "https://example.com/login",
            vec![MockElement::new("b1", "button").with_attr("aria-label", "Log in")],
        );
        let steps = vec![Step::new("b1", "Log in", Action::Click)];

        let orch = orchestrator();
        let plan = plan_for_steps(&steps);
        let mut run = RunState::new(RunId::new(), plan);
        run.record_blocked("https://example.com/login", "captcha interstitial");
        orch.drive(&driver, &mut run, &session(), &CancelSignal::new()).await;

        assert_eq!(run.verdict, Some(Verdict::Blocked));
    }

    #[tokio::test]
    async fn wait_action_pauses_at_await_human_then_resumes() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![
                MockElement::new("approval", "div").with_attr("aria-label", "Approval"),
                MockElement::new("next", "button").with_attr("aria-label", "Continue"),
            ],
        );
        let steps = vec![
            Step::new("approval", "Approval", Action::Wait),
            Step::new("next", "Continue", Action::Click),
        ];
        let plan = plan_for_steps(&steps);
        let mut run = RunState::new(RunId::new(), plan);

        let orch = orchestrator();
        let state = orch.drive(&driver, &mut run, &session(), &CancelSignal::new()).await;
        assert_eq!(state, OrchState::AwaitHuman);
        assert_eq!(run.step_idx, 0);
        assert!(run.verdict.is_none());

        let state = orch.resume(&driver, &mut run, &session()).await;
        assert_eq!(state, OrchState::Done);
        assert_eq!(run.verdict, Some(Verdict::Pass));
        assert_eq!(run.step_idx, 2);
    }

    #[tokio::test]
    async fn cache_warms_across_two_runs_against_the_same_url() {
        let driver = MockDriver::new(
            "https://example.com/login",
            vec![MockElement::new("u1", "input").with_attr("aria-label", "Username")],
        );
        let steps = vec![Step::new("u1", "Username", Action::Fill).with_value("x")];

        let cache = Arc::new(SelectorCache::new(EngineConfig::default(), Arc::new(Telemetry::new())));
        let orch = Orchestrator::new(
            EngineConfig::default(),
            cache,
            Arc::new(HealHistory::new()),
            Arc::new(Telemetry::new()),
        );

        let first = orch.run(&driver, steps.clone(), &session()).await;
        assert_eq!(first.verdict, Some(Verdict::Pass));
        assert_eq!(
            first.executed_steps[0].discovery_source,
            soulbrowser_core_types::DiscoverySource::Fresh
        );

        let second = orch.run(&driver, steps, &session()).await;
        assert_eq!(second.verdict, Some(Verdict::Pass));
        let source = second.executed_steps[0].discovery_source;
        assert!(matches!(
            source,
            soulbrowser_core_types::DiscoverySource::SessionCache
                | soulbrowser_core_types::DiscoverySource::DurableCache
        ));
    }

    #[tokio::test]
    async fn cancellation_between_steps_yields_partial() {
        let driver = MockDriver::new(
            "https://example.com",
            vec![
                MockElement::new("a", "button").with_attr("aria-label", "A"),
                MockElement::new("b", "button").with_attr("aria-label", "B"),
            ],
        );
        let steps = vec![
            Step::new("a", "A", Action::Click),
            Step::new("b", "B", Action::Click),
        ];
        let plan = plan_for_steps(&steps);
        let mut run = RunState::new(RunId::new(), plan);

        let orch = orchestrator();
        let cancel = CancelSignal::new();
        cancel.cancel();
        orch.drive(&driver, &mut run, &session(), &cancel).await;

        assert_eq!(run.verdict, Some(Verdict::Partial));
        assert_eq!(run.step_idx, 0);
    }
}
