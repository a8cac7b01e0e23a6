use serde::{Deserialize, Serialize};

/// One user action a [`Step`] may request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Click,
    Fill,
    Type,
    Press,
    Select,
    Check,
    Uncheck,
    Hover,
    Focus,
    Wait,
    Navigate,
}

impl Action {
    /// `true` for the two actions whose fallback chain in the Executor
    /// depends on whether a selector was already resolved this run
    /// (`press` after `fill` reuses `last_selector_ok`).
    pub fn is_fill_like(self) -> bool {
        matches!(self, Action::Fill | Action::Type)
    }
}

/// A single, immutable step of a [`TestSpec`]. The runtime-resolved
/// selector never lives on the step itself; it lives beside it in the
/// parallel [`crate::Plan`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub element_label: String,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ordinal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub element_type_hint: Option<String>,
}

impl Step {
    pub fn new(id: impl Into<String>, element_label: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            element_label: element_label.into(),
            action,
            value: None,
            region: None,
            outcome: None,
            ordinal: None,
            element_type_hint: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

/// Ordered sequence of [`Step`]s the Orchestrator drives to completion.
///
/// Variable substitution of `{{var}}` tokens and `{timestamp}` against a
/// data row happens upstream of this crate (an explicit non-goal of the
/// core); by the time a `TestSpec` reaches the engine every value is
/// already concrete.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestSpec {
    pub req_id: String,
    pub url: String,
    pub steps: Vec<Step>,
}

impl TestSpec {
    pub fn new(req_id: impl Into<String>, url: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            req_id: req_id.into(),
            url: url.into(),
            steps,
        }
    }
}
