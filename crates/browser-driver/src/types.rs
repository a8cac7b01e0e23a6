use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque handle to a resolved DOM node. Implementations are free to
/// wrap whatever identifier their underlying automation library uses
/// (a CDP backend node id, a WebDriver element reference, ...); the
/// core never interprets the string.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Axis-aligned bounding box in page coordinates, as returned by
/// `bounding_box()`. Used by the Gate's stable-bbox check (§4.5) and by
/// the healer's reveal/stability-wait steps (§4.7).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Per-axis pixel delta against another sample, as consumed by the
    /// Gate's stable_bbox check (§4.5: "each axis differs from sample-0
    /// by at most `tol` pixels").
    pub fn max_axis_delta(&self, other: &Rect) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.width - other.width).abs())
            .max((self.height - other.height).abs())
    }
}

/// Condition `wait_for_load_state` can be asked to wait for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    DomContentLoaded,
    NetworkIdle,
}

/// A semantic locator expressed as role + accessible name, the
/// counterpart to a CSS-like selector string required by the discovery
/// tiers that search the accessibility tree (role+accessible-name,
/// label proximity — §4.1).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoleLocator {
    pub role: String,
    pub accessible_name: String,
}

/// A value `evaluate()` can return: arbitrary JSON, since page scripts
/// can hand back anything.
pub type EvalResult = Value;

/// Canonical JS snippet the Selector Cache's drift detection evaluates
/// to build the tag-name skeleton hashed into `dom_hash` (§4.2): a
/// depth-first walk of `document.body` emitting tag names only, text
/// omitted, joined by `>`. Callers pass this exact string to
/// `evaluate()` so every driver implementation (and the mock) can
/// special-case it rather than re-deriving the convention.
pub const DOM_SKELETON_SCRIPT: &str = r#"(() => {
  const tags = [];
  const walk = (node) => {
    if (node.nodeType === 1) {
      tags.push(node.tagName.toLowerCase());
      for (const child of node.children) walk(child);
    }
  };
  walk(document.body);
  return tags.join(">");
})()"#;
