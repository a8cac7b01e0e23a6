use serde::{Deserialize, Serialize};

use crate::Step;

/// Where a [`PlanEntry`]'s selector came from. Surfaced in
/// `ExecutionRecord` so the run log can tell a fresh discovery apart
/// from a cache hit or a healed selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Fresh,
    SessionCache,
    DurableCache,
    Healed,
    ReusedPrev,
}

/// The runtime counterpart of a [`Step`]: the selector discovery (or
/// healing) resolved for it, alongside the step itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanEntry {
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub strategy: Option<String>,
    pub confidence: f64,
    pub stable: bool,
    pub discovery_source: DiscoverySource,
}

impl PlanEntry {
    pub fn unresolved(step: Step) -> Self {
        Self {
            step,
            selector: None,
            strategy: None,
            confidence: 0.0,
            stable: false,
            discovery_source: DiscoverySource::Fresh,
        }
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }
}

/// One [`PlanEntry`] per [`Step`] of a [`crate::TestSpec`], in order.
pub type Plan = Vec<PlanEntry>;

/// Build an all-unresolved plan for a freshly ingested test spec.
pub fn plan_for_steps(steps: &[Step]) -> Plan {
    steps.iter().cloned().map(PlanEntry::unresolved).collect()
}
