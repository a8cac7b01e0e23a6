use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Plan, RunId};

/// The failure taxonomy observed at the Gate/Executor boundary. `Timeout`
/// is the catch-all for unexpected driver errors and for any Discovery
/// or Execution fault that does not map to one of the gate's four
/// specific checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    None,
    NotUnique,
    NotVisible,
    Disabled,
    Unstable,
    Timeout,
}

impl Default for Failure {
    fn default() -> Self {
        Failure::None
    }
}

/// Final disposition of a run, in the Orchestrator's verdict precedence
/// order: `Blocked` supersedes everything, then `Pass`, then `Fail` vs.
/// `Partial` depending on how far execution got.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Partial,
    Blocked,
}

/// Snapshot of the Gate's five checks, attached to a [`HealEvent`] so the
/// run log shows exactly which check failed going into a heal round.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GateOutcome {
    pub unique: bool,
    pub visible: bool,
    pub enabled: bool,
    pub stable_bbox: bool,
    pub scoped: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

impl GateOutcome {
    pub fn all_pass(&self) -> bool {
        self.unique && self.visible && self.enabled && self.stable_bbox && self.scoped
    }

    /// Map the first failing check to a [`Failure`] kind, per §4.5's
    /// mapping table. Returns `Failure::None` when every check passed.
    pub fn failure_kind(&self) -> Failure {
        if !self.unique {
            Failure::NotUnique
        } else if !self.visible {
            Failure::NotVisible
        } else if !self.enabled {
            Failure::Disabled
        } else if !self.stable_bbox {
            Failure::Unstable
        } else {
            Failure::None
        }
    }
}

/// One completed action, appended to `RunState::executed_steps` in
/// execution order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub step_idx: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selector: Option<String>,
    pub action: crate::Action,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    pub heal_round: u32,
    pub discovery_source: crate::DiscoverySource,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub screenshot_path: Option<String>,
}

/// One heal round's full trace, appended to `RunState::heal_events` in
/// execution order regardless of whether the round succeeded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealEvent {
    pub round: u32,
    pub step_idx: usize,
    pub failure_type: Failure,
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub learned_strategies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gate_result: Option<GateOutcome>,
    pub duration_ms: u64,
    pub success: bool,
}

/// A consumer-supplied marker that the target has interposed an
/// anti-automation / CAPTCHA page; recording one forces `verdict=blocked`
/// regardless of step progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockedSignal {
    pub url: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Single-writer run state: only the Orchestrator mutates this. Created
/// at run start, destroyed at run end.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunState {
    pub req_id: RunId,
    pub step_idx: usize,
    pub heal_round: u32,
    pub failure: Failure,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_selector_ok: Option<String>,
    pub plan: Plan,
    pub heal_events: Vec<HealEvent>,
    pub executed_steps: Vec<ExecutionRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verdict: Option<Verdict>,
    pub context: HashMap<String, String>,
    pub blocked_signals: Vec<BlockedSignal>,
}

impl RunState {
    pub fn new(req_id: RunId, plan: Plan) -> Self {
        Self {
            req_id,
            step_idx: 0,
            heal_round: 0,
            failure: Failure::None,
            last_selector_ok: None,
            plan,
            heal_events: Vec::new(),
            executed_steps: Vec::new(),
            verdict: None,
            context: HashMap::new(),
            blocked_signals: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.step_idx >= self.plan.len()
    }

    pub fn current_entry(&self) -> Option<&crate::PlanEntry> {
        self.plan.get(self.step_idx)
    }

    pub fn current_entry_mut(&mut self) -> Option<&mut crate::PlanEntry> {
        self.plan.get_mut(self.step_idx)
    }

    pub fn record_blocked(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        self.blocked_signals.push(BlockedSignal {
            url: url.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        });
    }
}
