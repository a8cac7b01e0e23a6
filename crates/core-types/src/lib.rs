//! Shared data model for the UI-test execution engine: the declarative
//! [`TestSpec`]/[`Step`] input, the runtime [`Plan`]/[`RunState`], the two
//! cache record shapes, the heal-history record, and the engine-wide
//! [`EngineConfig`].
//!
//! This crate has no async runtime dependency and no I/O: it is the
//! vocabulary every other crate in the workspace shares.

mod config;
mod plan;
mod run_state;
mod severity;
mod spec;
mod store;

pub use config::{EngineConfig, ReadinessProfile};
pub use plan::{plan_for_steps, DiscoverySource, Plan, PlanEntry};
pub use run_state::{
    BlockedSignal, ExecutionRecord, Failure, GateOutcome, HealEvent, RunState, Verdict,
};
pub use severity::Severity;
pub use spec::{Action, Step, TestSpec};
pub use store::{CacheEntry, HealRecord, SessionCacheEntry};

use uuid::Uuid;

/// Opaque run identifier, generated once per [`RunState`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
