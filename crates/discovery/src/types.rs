use soulbrowser_core_types::{Action, Step};

/// The input to the Discovery Engine (§4.4): everything a strategy
/// needs to turn a human-readable label into a selector.
#[derive(Clone, Debug)]
pub struct Intent {
    pub element_label: String,
    pub action: Action,
    pub value: Option<String>,
    pub region: Option<String>,
    pub ordinal: Option<u32>,
    pub element_type_hint: Option<String>,
    /// Learned-strategy hint the Healer sets on reprobe (§4.7 step 2):
    /// tiers named here are tried first, in this order, ahead of the
    /// rest of the cascade. Empty for a fresh (non-healing) discovery.
    pub preferred_strategies: Vec<Strategy>,
}

impl From<&Step> for Intent {
    fn from(step: &Step) -> Self {
        Self {
            element_label: step.element_label.clone(),
            action: step.action,
            value: step.value.clone(),
            region: step.region.clone(),
            ordinal: step.ordinal,
            element_type_hint: step.element_type_hint.clone(),
            preferred_strategies: Vec::new(),
        }
    }
}

/// A tagged enumeration of the closed strategy set (§9 "Polymorphism":
/// "implement as a tagged variant ... Do not use subtype polymorphism").
/// Order matches the cascade's tier numbering; `cascade_order()` is the
/// authoritative iteration order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    AriaLabel,
    AriaPlaceholder,
    Name,
    Placeholder,
    LabelFor,
    RoleName,
    DataTestHook,
    IdClass,
    Override,
}

impl Strategy {
    pub fn tier(self) -> u8 {
        match self {
            Strategy::AriaLabel => 1,
            Strategy::AriaPlaceholder => 2,
            Strategy::Name => 3,
            Strategy::Placeholder => 4,
            Strategy::LabelFor => 5,
            Strategy::RoleName => 6,
            Strategy::DataTestHook => 7,
            Strategy::IdClass => 8,
            Strategy::Override => 0,
        }
    }

    /// Strategy name string, shared with `soulbrowser-selector-cache`'s
    /// stability lists — the two crates must agree on this vocabulary.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::AriaLabel => "aria-label",
            Strategy::AriaPlaceholder => "aria-placeholder",
            Strategy::Name => "name",
            Strategy::Placeholder => "placeholder",
            Strategy::LabelFor => "label-for",
            Strategy::RoleName => "role-name",
            Strategy::DataTestHook => "data-test-hook",
            Strategy::IdClass => "id-class",
            Strategy::Override => "override",
        }
    }

    /// Per §4.2/§4.4, overrides are never cached: they bypass the
    /// cascade entirely and carry no stability guarantee of their own.
    pub fn stable(self) -> bool {
        matches!(
            self,
            Strategy::AriaLabel
                | Strategy::AriaPlaceholder
                | Strategy::Name
                | Strategy::Placeholder
                | Strategy::LabelFor
                | Strategy::DataTestHook
        )
    }

    /// `(min, max)` score range from the cascade table (§4.4).
    pub fn score_range(self) -> (f64, f64) {
        match self {
            Strategy::AriaLabel => (0.96, 0.98),
            Strategy::AriaPlaceholder => (0.94, 0.96),
            Strategy::Name => (0.92, 0.94),
            Strategy::Placeholder => (0.88, 0.90),
            Strategy::LabelFor => (0.86, 0.86),
            Strategy::RoleName => (0.93, 0.95),
            Strategy::DataTestHook => (0.80, 0.80),
            Strategy::IdClass => (0.65, 0.70),
            Strategy::Override => (1.0, 1.0),
        }
    }

    /// Ordered cascade, tiers 1 through 8 (§4.4 table). `Override` is
    /// handled separately, before this cascade ever runs.
    pub fn cascade_order() -> [Strategy; 8] {
        [
            Strategy::AriaLabel,
            Strategy::AriaPlaceholder,
            Strategy::Name,
            Strategy::Placeholder,
            Strategy::LabelFor,
            Strategy::RoleName,
            Strategy::DataTestHook,
            Strategy::IdClass,
        ]
    }

    /// Parse a strategy name back from the string vocabulary shared
    /// with `soulbrowser-selector-cache` and heal-history records
    /// (§4.3 `get_best_strategy` returns these names as `String`s).
    pub fn from_name(name: &str) -> Option<Strategy> {
        Strategy::cascade_order()
            .into_iter()
            .chain(std::iter::once(Strategy::Override))
            .find(|s| s.name() == name)
    }
}

/// A successful discovery: a selector plus the metadata the Plan and
/// Cache need (§3 PlanEntry, §4.2 admission).
#[derive(Clone, Debug)]
pub struct DiscoveryResult {
    pub selector: String,
    pub score: f64,
    pub strategy: Strategy,
    pub stable: bool,
    /// Set when tier 6's last-resort positional disambiguation fired
    /// (§4.4 "(c) last-resort positional `nth=0` with a lowered score
    /// and a `warning=non_unique` flag").
    pub warning: Option<String>,
}
