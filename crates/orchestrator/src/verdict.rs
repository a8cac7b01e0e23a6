use soulbrowser_core_types::{Failure, RunState, Verdict};

/// Verdict precedence rules, applied in order at `DONE` (§4.8):
///
/// 1. Any recorded blocked-page signal → `blocked`, regardless of
///    progress.
/// 2. Every step executed → `pass`.
/// 3. A late step whose heal budget was exhausted (the only path by
///    which this FSM reaches `DONE` with steps remaining, short of
///    external cancellation) → `fail`.
/// 4. Otherwise (reached `DONE` via a run-level cancellation signal
///    with some steps already succeeded; see §5, §9 O4) → `partial`.
pub fn compute_verdict(run: &RunState, max_heal_rounds: u32, cancelled: bool) -> Verdict {
    if !run.blocked_signals.is_empty() {
        return Verdict::Blocked;
    }
    if run.is_done() {
        return Verdict::Pass;
    }
    if cancelled {
        return Verdict::Partial;
    }
    if run.heal_round >= max_heal_rounds && run.failure != Failure::None {
        return Verdict::Fail;
    }
    Verdict::Partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_core_types::{plan_for_steps, Action, RunId, Step};

    fn run_with(n: usize) -> RunState {
        let steps: Vec<Step> = (0..n)
            .map(|i| Step::new(format!("s{i}"), format!("Label {i}"), Action::Click))
            .collect();
        RunState::new(RunId::new(), plan_for_steps(&steps))
    }

    #[test]
    fn blocked_supersedes_everything() {
        let mut run = run_with(2);
        run.step_idx = 2;
        run.record_blocked("https://x.com", "captcha");
        assert_eq!(compute_verdict(&run, 3, false), Verdict::Blocked);
    }

    #[test]
    fn all_steps_executed_is_pass() {
        let mut run = run_with(2);
        run.step_idx = 2;
        assert_eq!(compute_verdict(&run, 3, false), Verdict::Pass);
    }

    #[test]
    fn exhausted_heal_budget_is_fail() {
        let mut run = run_with(2);
        run.step_idx = 1;
        run.heal_round = 3;
        run.failure = Failure::NotVisible;
        assert_eq!(compute_verdict(&run, 3, false), Verdict::Fail);
    }

    #[test]
    fn cancellation_mid_run_is_partial() {
        let mut run = run_with(3);
        run.step_idx = 1;
        assert_eq!(compute_verdict(&run, 3, true), Verdict::Partial);
    }
}
