//! A hand-rolled, in-memory [`BrowserDriver`] for deterministic tests:
//! a fake page model plus a tiny selector interpreter good enough to
//! exercise the discovery/gate/executor/healer/orchestrator suites
//! without a real browser.
//!
//! This module is not behind `#[cfg(test)]` because every other crate
//! in the workspace depends on it as a dev-dependency.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::DriverError;
use crate::types::{ElementHandle, EvalResult, LoadState, Rect};
use crate::BrowserDriver;

/// One fake DOM node. `id` doubles as the [`ElementHandle`] payload.
#[derive(Clone, Debug)]
pub struct MockElement {
    pub id: String,
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: Option<String>,
    pub role: Option<String>,
    pub accessible_name: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    pub rect: Rect,
    /// id of the nearest named region container (dialog/form/main),
    /// used by `is_descendant_of` to back the Gate's `scoped` check.
    pub container: Option<String>,
}

impl MockElement {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            attrs: HashMap::new(),
            text: None,
            role: None,
            accessible_name: None,
            visible: true,
            enabled: true,
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 20.0,
            },
            container: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self.accessible_name = Some(name.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    fn matches_attr(&self, key: &str, value: &str) -> bool {
        match key {
            "id" => self.id == value,
            "aria-label" | "aria-placeholder" | "name" | "placeholder" | "data-testid"
            | "data-test" | "data-qa" | "data-cy" | "data-automation" | "for" | "type" => {
                self.attrs.get(key).map(String::as_str) == Some(value)
            }
            other => self.attrs.get(other).map(String::as_str) == Some(value),
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .map(|c| c.split_whitespace().any(|t| t == class))
            .unwrap_or(false)
    }
}

/// Event the test asserts against after a scenario runs: a record of
/// every mutating call the mock received, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    Goto(String),
    Click(String),
    Fill(String, String),
    Type(String, String),
    PressOn(String, String),
    PressKey(String),
    Select(String, String),
    Check(String),
    Uncheck(String),
    Hover(String),
    Focus(String),
    ScrollIntoView(String),
}

struct MockState {
    elements: Vec<MockElement>,
    current_url: String,
    calls: Vec<MockCall>,
    /// elements removed/replaced mid-test to simulate DOM churn (press-
    /// after-fill scenario 6).
    removed: Vec<String>,
    /// ids that become visible the moment they are scrolled into view,
    /// modeling a below-the-fold element revealed by the Healer.
    reveal_on_scroll: Vec<String>,
    /// id -> replacement, swapped in the instant that id is filled,
    /// modeling a page that re-renders an input after it receives input.
    replace_on_fill: Option<(String, MockElement)>,
}

/// Deterministic fake browser backing the engine's test suites.
/// `Mutex`-guarded since the trait requires `Sync` but tests drive it
/// from a single task at a time; no real concurrency is exercised.
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new(url: impl Into<String>, elements: Vec<MockElement>) -> Self {
        Self {
            state: Mutex::new(MockState {
                elements,
                current_url: url.into(),
                calls: Vec::new(),
                removed: Vec::new(),
                reveal_on_scroll: Vec::new(),
                replace_on_fill: None,
            }),
        }
    }

    /// Arrange for `id` to flip `visible = true` the instant it is
    /// scrolled into view, instead of requiring a test to race the
    /// Healer's reveal step with a manual mutation.
    pub fn reveal_on_scroll(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .reveal_on_scroll
            .push(id.to_string());
    }

    /// Arrange for `old_id` to be swapped for `new` the instant it is
    /// filled, instead of requiring a test to race the executor with a
    /// manual `replace_element` call.
    pub fn replace_on_fill(&self, old_id: &str, new: MockElement) {
        self.state.lock().unwrap().replace_on_fill = Some((old_id.to_string(), new));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Replace an element's id and rect in place, simulating a DOM node
    /// swap (scenario 6: "the page replaces the input's DOM node on
    /// fill").
    pub fn replace_element(&self, old_id: &str, new: MockElement) {
        let mut state = self.state.lock().unwrap();
        state.removed.push(old_id.to_string());
        state.elements.retain(|e| e.id != old_id);
        state.elements.push(new);
    }

    pub fn remove_element(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.removed.push(id.to_string());
        state.elements.retain(|e| e.id != id);
    }

    pub fn set_current_url(&self, url: impl Into<String>) {
        self.state.lock().unwrap().current_url = url.into();
    }

    pub fn mutate<F: FnOnce(&mut MockElement)>(&self, id: &str, f: F) {
        let mut state = self.state.lock().unwrap();
        if let Some(el) = state.elements.iter_mut().find(|e| e.id == id) {
            f(el);
        }
    }

    fn find(&self, id: &str) -> Option<MockElement> {
        self.state
            .lock()
            .unwrap()
            .elements
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    fn select_all(&self, selector: &str) -> Vec<MockElement> {
        let state = self.state.lock().unwrap();
        select(&state.elements, selector)
    }
}

/// Minimal selector interpreter matching the grammar the discovery
/// crate's strategy cascade emits: an optional tag prefix, any number
/// of `[attr="value"]` conditions, `#id`, `.class`, `role=ROLE[name=
/// "NAME"]`, `:has-text("...")`, and a trailing `:nth(N)`.
fn select(elements: &[MockElement], selector: &str) -> Vec<MockElement> {
    let mut sel = selector.trim();

    let mut nth: Option<usize> = None;
    if let Some(pos) = sel.rfind(":nth(") {
        if let Some(end) = sel[pos..].find(')') {
            if let Ok(n) = sel[pos + 5..pos + end].parse::<usize>() {
                nth = Some(n);
            }
            sel = &sel[..pos];
        }
    }

    let mut has_text: Option<String> = None;
    if let Some(pos) = sel.find(":has-text(") {
        if let Some(end) = sel[pos..].find(')') {
            let inner = &sel[pos + 10..pos + end];
            has_text = Some(inner.trim_matches('"').to_string());
            sel = &sel[..pos];
        }
    }

    let mut role_filter: Option<String> = None;
    if let Some(rest) = sel.strip_prefix("role=") {
        let (role, tail) = match rest.find('[') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        role_filter = Some(role.to_string());
        sel = tail;
    }

    let mut id_filter: Option<String> = None;
    let mut class_filter: Option<String> = None;
    let mut tag_filter: Option<String> = None;
    let mut attr_filters: Vec<(String, String)> = Vec::new();
    let mut presence_filters: Vec<String> = Vec::new();
    let mut name_filter: Option<String> = None;

    let mut rest = sel;
    if let Some(idx) = rest.find(['#', '.', '[']) {
        if idx > 0 {
            tag_filter = Some(rest[..idx].to_string());
        }
        rest = &rest[idx..];
    } else if !rest.is_empty() {
        tag_filter = Some(rest.to_string());
        rest = "";
    }

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('#') {
            let end = stripped
                .find(['.', '['])
                .unwrap_or(stripped.len());
            id_filter = Some(stripped[..end].to_string());
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped
                .find(['.', '['])
                .unwrap_or(stripped.len());
            class_filter = Some(stripped[..end].to_string());
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']').unwrap_or(stripped.len());
            let cond = &stripped[..end];
            if let Some((k, v)) = cond.split_once('=') {
                let key = k.trim();
                let value = v.trim().trim_matches('"');
                if key == "name" && role_filter.is_some() {
                    name_filter = Some(value.to_string());
                } else {
                    attr_filters.push((key.to_string(), value.to_string()));
                }
            } else {
                presence_filters.push(cond.trim().to_string());
            }
            rest = stripped.get(end + 1..).unwrap_or("");
        } else {
            break;
        }
    }

    let mut matches: Vec<MockElement> = elements
        .iter()
        .filter(|e| {
            if let Some(tag) = &tag_filter {
                if tag != "*" && &e.tag != tag {
                    return false;
                }
            }
            if let Some(id) = &id_filter {
                if &e.id != id {
                    return false;
                }
            }
            if let Some(class) = &class_filter {
                if !e.has_class(class) {
                    return false;
                }
            }
            for (k, v) in &attr_filters {
                if !e.matches_attr(k, v) {
                    return false;
                }
            }
            for k in &presence_filters {
                if !e.attrs.contains_key(k.as_str()) {
                    return false;
                }
            }
            if let Some(role) = &role_filter {
                if e.role.as_deref() != Some(role.as_str()) {
                    return false;
                }
            }
            if let Some(name) = &name_filter {
                if e.accessible_name.as_deref() != Some(name.as_str()) {
                    return false;
                }
            }
            if let Some(text) = &has_text {
                let haystack = e.text.as_deref().unwrap_or("");
                if !haystack.contains(text.as_str()) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();

    if let Some(n) = nth {
        matches = matches.into_iter().nth(n).into_iter().collect();
    }

    matches
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn goto(&self, url: &str, _wait_condition: LoadState) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.current_url = url.to_string();
        state.calls.push(MockCall::Goto(url.to_string()));
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        Ok(self
            .select_all(selector)
            .into_iter()
            .next()
            .map(|e| ElementHandle::new(e.id)))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DriverError> {
        Ok(self
            .select_all(selector)
            .into_iter()
            .map(|e| ElementHandle::new(e.id))
            .collect())
    }

    async fn locator_count(&self, selector: &str) -> Result<usize, DriverError> {
        Ok(self.select_all(selector).len())
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, DriverError> {
        self.find(&handle.0)
            .map(|e| e.visible)
            .ok_or_else(|| DriverError::HandleNotFound(handle.0.clone()))
    }

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool, DriverError> {
        self.find(&handle.0)
            .map(|e| e.enabled)
            .ok_or_else(|| DriverError::HandleNotFound(handle.0.clone()))
    }

    async fn bounding_box(&self, handle: &ElementHandle) -> Result<Option<Rect>, DriverError> {
        Ok(self.find(&handle.0).map(|e| e.rect))
    }

    async fn is_descendant_of(
        &self,
        handle: &ElementHandle,
        container: &ElementHandle,
    ) -> Result<bool, DriverError> {
        let el = self
            .find(&handle.0)
            .ok_or_else(|| DriverError::HandleNotFound(handle.0.clone()))?;
        Ok(el.container.as_deref() == Some(container.0.as_str()) || el.id == container.0)
    }

    async fn evaluate(&self, js: &str) -> Result<EvalResult, DriverError> {
        if js == crate::types::DOM_SKELETON_SCRIPT {
            let state = self.state.lock().unwrap();
            let skeleton = state
                .elements
                .iter()
                .map(|e| e.tag.as_str())
                .collect::<Vec<_>>()
                .join(">");
            return Ok(EvalResult::String(skeleton));
        }
        Ok(EvalResult::Null)
    }

    async fn tag_name(&self, handle: &ElementHandle) -> Result<String, DriverError> {
        self.find(&handle.0)
            .map(|e| e.tag)
            .ok_or_else(|| DriverError::HandleNotFound(handle.0.clone()))
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.find(&handle.0)
            .map(|e| e.attrs.get(name).cloned())
            .ok_or_else(|| DriverError::HandleNotFound(handle.0.clone()))
    }

    async fn press_key(&self, _key: &str) -> Result<(), DriverError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::PressKey(_key.to_string()));
        Ok(())
    }

    async fn click(&self, handle: &ElementHandle, _timeout_ms: u64) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Click(handle.0.clone()));
        Ok(())
    }

    async fn fill(
        &self,
        handle: &ElementHandle,
        value: &str,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.mutate(&handle.0, |e| {
            e.attrs.insert("value".into(), value.into());
        });
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(MockCall::Fill(handle.0.clone(), value.to_string()));
        if state
            .replace_on_fill
            .as_ref()
            .is_some_and(|(old_id, _)| old_id == &handle.0)
        {
            let (old_id, new) = state.replace_on_fill.take().unwrap();
            state.removed.push(old_id.clone());
            state.elements.retain(|e| e.id != old_id);
            state.elements.push(new);
        }
        Ok(())
    }

    async fn type_text(
        &self,
        handle: &ElementHandle,
        value: &str,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Type(handle.0.clone(), value.to_string()));
        Ok(())
    }

    async fn press_on(
        &self,
        handle: &ElementHandle,
        key: &str,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::PressOn(handle.0.clone(), key.to_string()));
        Ok(())
    }

    async fn select(
        &self,
        handle: &ElementHandle,
        value: &str,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Select(handle.0.clone(), value.to_string()));
        Ok(())
    }

    async fn check(&self, handle: &ElementHandle, _timeout_ms: u64) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Check(handle.0.clone()));
        Ok(())
    }

    async fn uncheck(&self, handle: &ElementHandle, _timeout_ms: u64) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Uncheck(handle.0.clone()));
        Ok(())
    }

    async fn hover(&self, handle: &ElementHandle, _timeout_ms: u64) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Hover(handle.0.clone()));
        Ok(())
    }

    async fn focus(&self, handle: &ElementHandle, _timeout_ms: u64) -> Result<(), DriverError> {
        if self.find(&handle.0).is_none() {
            return Err(DriverError::HandleNotFound(handle.0.clone()));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(MockCall::Focus(handle.0.clone()));
        Ok(())
    }

    async fn wait_for_load_state(
        &self,
        _state: LoadState,
        _timeout_ms: u64,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(MockCall::ScrollIntoView(handle.0.clone()));
        if state.reveal_on_scroll.iter().any(|id| id == &handle.0) {
            if let Some(el) = state.elements.iter_mut().find(|e| e.id == handle.0) {
                el.visible = true;
            }
        }
        Ok(())
    }

    async fn scroll_by(&self, _dx: f64, _dy: f64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn screenshot(&self, _path: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn bring_to_front(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_attribute_conditions() {
        let els = vec![MockElement::new("u1", "input").with_attr("aria-label", "Username")];
        let found = select(&els, "[aria-label=\"Username\"]");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "u1");
    }

    #[test]
    fn selector_filters_by_role_and_name() {
        let els = vec![
            MockElement::new("b1", "button").with_role("button", "Log in"),
            MockElement::new("b2", "button").with_role("button", "Cancel"),
        ];
        let found = select(&els, "role=button[name=\"Log in\"]");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b1");
    }

    #[test]
    fn nth_selects_positionally_after_filtering() {
        let els = vec![
            MockElement::new("r1", "div").with_role("row", "x"),
            MockElement::new("r2", "div").with_role("row", "x"),
        ];
        let found = select(&els, "role=row:nth(1)");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r2");
    }

    #[tokio::test]
    async fn fill_errors_on_missing_handle() {
        let driver = MockDriver::new("https://example.com", vec![]);
        let err = driver
            .fill(&ElementHandle::new("ghost"), "x", 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::HandleNotFound(_)));
    }
}
