use async_trait::async_trait;

use crate::errors::DriverError;
use crate::types::{ElementHandle, EvalResult, LoadState, Rect};

/// The narrow capability interface the engine core depends on (§4.1).
/// Implementable atop any real browser-automation library (CDP,
/// WebDriver, ...); the core never imports a concrete driver.
///
/// Every operation here is fallible and every call is expected to carry
/// its own timeout internally — the core does not wrap driver calls in
/// an outer timeout itself (§5, "every driver call has a timeout").
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to `url` and wait for `wait_condition`.
    async fn goto(&self, url: &str, wait_condition: LoadState) -> Result<(), DriverError>;

    /// Resolve `selector` to a handle, or `None` if it matches nothing.
    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError>;

    /// All handles `selector` matches, in document order. Backs
    /// ordinal handling and tier-6 non-unique disambiguation (§4.4),
    /// which both need more than a single handle or a bare count.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DriverError>;

    /// Count of nodes `selector` matches, scoped to the whole page
    /// (callers scope the selector string itself for region scoping;
    /// see §4.4 region resolution).
    async fn locator_count(&self, selector: &str) -> Result<usize, DriverError>;

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, DriverError>;

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool, DriverError>;

    async fn bounding_box(&self, handle: &ElementHandle) -> Result<Option<Rect>, DriverError>;

    /// Whether `handle` is a descendant of the element `container`
    /// resolves to. Backs the Gate's `scoped` check (§4.5).
    async fn is_descendant_of(
        &self,
        handle: &ElementHandle,
        container: &ElementHandle,
    ) -> Result<bool, DriverError>;

    async fn evaluate(&self, js: &str) -> Result<EvalResult, DriverError>;

    /// Lower-cased HTML tag name, e.g. `"input"`. Backs Discovery's
    /// action-aware filtering (§4.4: rejecting `select`/`button`/
    /// typed-input candidates for `fill` actions).
    async fn tag_name(&self, handle: &ElementHandle) -> Result<String, DriverError>;

    /// A single DOM attribute's value, or `None` if absent. Backs the
    /// same action-aware filtering (reading `type="checkbox"` etc.).
    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn press_key(&self, key: &str) -> Result<(), DriverError>;

    async fn click(&self, handle: &ElementHandle, timeout_ms: u64) -> Result<(), DriverError>;

    async fn fill(
        &self,
        handle: &ElementHandle,
        value: &str,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    /// Character-by-character input, as opposed to `fill`'s atomic set
    /// (Executor's `type` action, §4.6).
    async fn type_text(
        &self,
        handle: &ElementHandle,
        value: &str,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    async fn press_on(
        &self,
        handle: &ElementHandle,
        key: &str,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    async fn select(
        &self,
        handle: &ElementHandle,
        value: &str,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    async fn check(&self, handle: &ElementHandle, timeout_ms: u64) -> Result<(), DriverError>;

    async fn uncheck(&self, handle: &ElementHandle, timeout_ms: u64) -> Result<(), DriverError>;

    async fn hover(&self, handle: &ElementHandle, timeout_ms: u64) -> Result<(), DriverError>;

    async fn focus(&self, handle: &ElementHandle, timeout_ms: u64) -> Result<(), DriverError>;

    async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    async fn scroll_into_view(&self, handle: &ElementHandle) -> Result<(), DriverError>;

    /// Scroll the page viewport by a relative amount, used by the
    /// Healer's "small incremental scroll for lazy layouts" step
    /// (§4.7).
    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<(), DriverError>;

    /// Best-effort screenshot. Failures here are never fatal to a step
    /// (§4.6 post-action, §7 "Screenshot faults → log only"); callers
    /// should swallow the `Err` rather than propagate it as a step
    /// failure.
    async fn screenshot(&self, path: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Bring the page to front (Healer reveal step, §4.7).
    async fn bring_to_front(&self) -> Result<(), DriverError>;
}
