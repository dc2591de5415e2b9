//! In-memory browser session for tests.
//!
//! [`FakeSession`] implements [`Session`] over a scripted DOM. Nodes are
//! registered under the exact [`By`] values the code under test will query,
//! so no selector engine is involved. It supports:
//!
//! - several windows, each holding one [`FakePage`]
//! - routes that build a page when its URL is visited
//! - click reactions that mutate the DOM (navigate, open a window, hide a node)
//! - injected transient click failures per [`ClickStrategy`]
//! - stale handles: removing a node or navigating away detaches it
//! - call counters ([`FakeStats`]) for side-effect assertions
//!
//! # Example
//!
//! ```ignore
//! let fake = FakeSession::new("https://example.test/");
//! fake.with_page(|page| {
//!     page.add(By::css("header"), FakeNode::new("header"));
//!     page.add(By::css("#apply"), FakeNode::new("button").fail_clicks(ClickStrategy::Direct, 1));
//! });
//!
//! let waits = Waits::new(fake.clone());
//! waits.click_with_retry(&By::css("#apply"), 3).await?;
//! assert_eq!(fake.stats().native_clicks, 2);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::trace;

use crate::browser::{By, Rect, Session, script};
use crate::error::{Error, Result, TransientKind};
use crate::identifiers::{ElementId, WindowHandle};
use crate::waits::ClickStrategy;

// ============================================================================
// Types
// ============================================================================

/// DOM mutation run when a node is clicked.
pub type Reaction = Arc<dyn Fn(&mut FakeDom) + Send + Sync>;

/// Page builder run when a URL is visited.
pub type Route = Arc<dyn Fn(&mut FakePage) + Send + Sync>;

/// Counters of the commands a [`FakeSession`] received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FakeStats {
    /// Native clicks, including failed ones.
    pub native_clicks: u32,
    /// Script-dispatched clicks, including failed ones.
    pub script_clicks: u32,
    /// Pointer gesture clicks, including failed ones.
    pub pointer_clicks: u32,
    /// Scroll-into-view scripts.
    pub scrolls: u32,
    /// Top-level element lookups.
    pub finds: u32,
    /// Scripts executed, of any kind.
    pub scripts: u32,
    /// Calls to `goto`.
    pub navigations: u32,
}

// ============================================================================
// FakeNode
// ============================================================================

/// A scripted DOM node.
#[derive(Clone)]
pub struct FakeNode {
    /// Lowercase tag name.
    pub tag: String,
    /// Rendered text.
    pub text: String,
    /// Whether the node's own style shows it.
    pub displayed: bool,
    /// Whether the node is enabled.
    pub enabled: bool,
    /// Whether the option, checkbox or radio is selected.
    pub selected: bool,
    /// Rendered bounding box.
    pub rect: Rect,
    on_click: Option<Reaction>,
    failures: Vec<InjectedFailure>,
}

#[derive(Debug, Clone, Copy)]
struct InjectedFailure {
    strategy: ClickStrategy,
    kind: TransientKind,
    remaining: u32,
}

impl fmt::Debug for FakeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeNode")
            .field("tag", &self.tag)
            .field("text", &self.text)
            .field("displayed", &self.displayed)
            .field("enabled", &self.enabled)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl FakeNode {
    /// Creates a displayed, enabled node with a 120x24 box.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            text: String::new(),
            displayed: true,
            enabled: true,
            selected: false,
            rect: Rect::new(0.0, 0.0, 120.0, 24.0),
            on_click: None,
            failures: Vec::new(),
        }
    }

    /// Sets the rendered text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Hides the node.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Disables the node.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Sets the selection state.
    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Sets the bounding box.
    #[must_use]
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Runs `reaction` after every successful click on this node.
    #[must_use]
    pub fn on_click<F>(mut self, reaction: F) -> Self
    where
        F: Fn(&mut FakeDom) + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(reaction));
        self
    }

    /// Makes the next `times` clicks through `strategy` fail as intercepted.
    ///
    /// `u32::MAX` means every click.
    #[must_use]
    pub fn fail_clicks(self, strategy: ClickStrategy, times: u32) -> Self {
        self.inject(strategy, TransientKind::Intercepted, times)
    }

    /// Makes the next `times` clicks through `strategy` fail as stale.
    #[must_use]
    pub fn stale_on_click(self, strategy: ClickStrategy, times: u32) -> Self {
        self.inject(strategy, TransientKind::Stale, times)
    }

    fn inject(mut self, strategy: ClickStrategy, kind: TransientKind, remaining: u32) -> Self {
        self.failures.push(InjectedFailure {
            strategy,
            kind,
            remaining,
        });
        self
    }

    fn take_failure(&mut self, strategy: ClickStrategy) -> Option<TransientKind> {
        let failure = self
            .failures
            .iter_mut()
            .find(|f| f.strategy == strategy && f.remaining > 0)?;
        if failure.remaining != u32::MAX {
            failure.remaining -= 1;
        }
        Some(failure.kind)
    }
}

// ============================================================================
// FakePage
// ============================================================================

/// The document of one window.
#[derive(Debug, Default)]
pub struct FakePage {
    url: String,
    nodes: FxHashMap<ElementId, FakeNode>,
    matches: FxHashMap<By, Vec<ElementId>>,
    children: FxHashMap<(ElementId, By), Vec<ElementId>>,
    parents: FxHashMap<ElementId, ElementId>,
}

impl FakePage {
    /// Creates an empty page at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns the page URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Adds a top-level node found by `by`.
    pub fn add(&mut self, by: By, node: FakeNode) -> ElementId {
        let id = ElementId::generate();
        self.nodes.insert(id.clone(), node);
        self.matches.entry(by).or_default().push(id.clone());
        id
    }

    /// Makes an existing node also match `by` at page level.
    pub fn alias(&mut self, id: &ElementId, by: By) {
        self.matches.entry(by).or_default().push(id.clone());
    }

    /// Adds a node found by `by` inside `parent`.
    ///
    /// The node is only reachable through its parent, unless aliased.
    pub fn add_child(&mut self, parent: &ElementId, by: By, node: FakeNode) -> ElementId {
        let id = ElementId::generate();
        self.nodes.insert(id.clone(), node);
        self.parents.insert(id.clone(), parent.clone());
        self.children
            .entry((parent.clone(), by))
            .or_default()
            .push(id.clone());
        id
    }

    /// Returns a node.
    #[must_use]
    pub fn node(&self, id: &ElementId) -> Option<&FakeNode> {
        self.nodes.get(id)
    }

    /// Returns a node for mutation.
    pub fn node_mut(&mut self, id: &ElementId) -> Option<&mut FakeNode> {
        self.nodes.get_mut(id)
    }

    /// Detaches a node and all its descendants.
    ///
    /// Returns `false` if the node was already gone.
    pub fn remove(&mut self, id: &ElementId) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        loop {
            let orphans: Vec<ElementId> = self
                .parents
                .iter()
                .filter(|(_, parent)| !self.nodes.contains_key(*parent))
                .map(|(child, _)| child.clone())
                .collect();
            if orphans.is_empty() {
                break;
            }
            for orphan in orphans {
                self.parents.remove(&orphan);
                self.nodes.remove(&orphan);
            }
        }
        true
    }

    /// Removes every node matched by `by` at page level.
    pub fn remove_all(&mut self, by: &By) {
        for id in self.matches.remove(by).unwrap_or_default() {
            self.remove(&id);
        }
    }

    fn find(&self, by: &By) -> Vec<ElementId> {
        self.attached(self.matches.get(by))
    }

    fn find_in(&self, parent: &ElementId, by: &By) -> Vec<ElementId> {
        self.attached(self.children.get(&(parent.clone(), by.clone())))
    }

    fn attached(&self, ids: Option<&Vec<ElementId>>) -> Vec<ElementId> {
        ids.map(|ids| {
            ids.iter()
                .filter(|id| self.nodes.contains_key(*id))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
    }

    fn live(&self, id: &ElementId) -> Result<&FakeNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::stale_element(id.clone()))
    }

    fn live_mut(&mut self, id: &ElementId) -> Result<&mut FakeNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::stale_element(id.clone()))
    }

    /// A node is displayed when it and every ancestor are.
    fn is_displayed(&self, id: &ElementId) -> Result<bool> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if !self.live(node_id)?.displayed {
                return Ok(false);
            }
            current = self.parents.get(node_id);
        }
        Ok(true)
    }

    fn select_option(&mut self, id: &ElementId) {
        if let Some(parent) = self.parents.get(id).cloned() {
            let siblings: Vec<ElementId> = self
                .parents
                .iter()
                .filter(|(_, p)| **p == parent)
                .map(|(child, _)| child.clone())
                .collect();
            for sibling in siblings {
                if let Some(node) = self.nodes.get_mut(&sibling)
                    && node.tag == "option"
                {
                    node.selected = false;
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.selected = true;
        }
    }
}

// ============================================================================
// FakeDom
// ============================================================================

/// Every window of a [`FakeSession`], plus its routes and counters.
pub struct FakeDom {
    windows: Vec<(WindowHandle, FakePage)>,
    current: usize,
    routes: FxHashMap<String, Route>,
    ready_state: String,
    stats: FakeStats,
    last_clicked: Option<ElementId>,
}

impl fmt::Debug for FakeDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeDom")
            .field("windows", &self.windows.len())
            .field("current", &self.current)
            .field("url", &self.page().url)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl FakeDom {
    fn new(url: &str) -> Self {
        Self {
            windows: vec![(WindowHandle::generate(), FakePage::new(url))],
            current: 0,
            routes: FxHashMap::default(),
            ready_state: "complete".to_string(),
            stats: FakeStats::default(),
            last_clicked: None,
        }
    }

    /// Returns the page of the current window.
    #[must_use]
    pub fn page(&self) -> &FakePage {
        &self.windows[self.current].1
    }

    /// Returns the page of the current window for mutation.
    pub fn page_mut(&mut self) -> &mut FakePage {
        &mut self.windows[self.current].1
    }

    /// Replaces the current window's page with a fresh one for `url`.
    ///
    /// Every handle into the old page goes stale.
    pub fn navigate(&mut self, url: &str) {
        let page = self.build_page(url);
        self.windows[self.current].1 = page;
    }

    /// Opens `url` in a new window, without switching to it.
    pub fn open_window(&mut self, url: &str) -> WindowHandle {
        let handle = WindowHandle::generate();
        let page = self.build_page(url);
        self.windows.push((handle.clone(), page));
        handle
    }

    /// Sets what `document.readyState` reports.
    pub fn set_ready_state(&mut self, state: &str) {
        self.ready_state = state.to_string();
    }

    fn build_page(&self, url: &str) -> FakePage {
        let mut page = FakePage::new(url);
        if let Some(route) = self.routes.get(url) {
            route(&mut page);
        }
        page
    }

    fn click(&mut self, id: &ElementId, strategy: ClickStrategy) -> Result<()> {
        match strategy {
            ClickStrategy::Direct => self.stats.native_clicks += 1,
            ClickStrategy::Scripted => self.stats.script_clicks += 1,
            ClickStrategy::Gesture => self.stats.pointer_clicks += 1,
        }

        let node = self.page_mut().live_mut(id)?;
        if let Some(kind) = node.take_failure(strategy) {
            trace!(element_id = %id, %strategy, %kind, "Injected click failure");
            return Err(match kind {
                TransientKind::Stale => Error::stale_element(id.clone()),
                TransientKind::Intercepted => {
                    Error::click_intercepted(id.clone(), "other element would receive the click")
                }
            });
        }
        let is_option = node.tag == "option";
        let reaction = node.on_click.clone();

        if is_option {
            self.page_mut().select_option(id);
        }
        self.last_clicked = Some(id.clone());
        if let Some(reaction) = reaction {
            reaction(self);
        }
        Ok(())
    }
}

// ============================================================================
// FakeSession
// ============================================================================

/// A [`Session`] over an in-memory DOM.
#[derive(Debug)]
pub struct FakeSession {
    dom: Mutex<FakeDom>,
}

impl FakeSession {
    /// Creates a session with one window showing an empty page at `url`.
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            dom: Mutex::new(FakeDom::new(url)),
        })
    }

    /// Registers a page builder run whenever `url` is visited.
    pub fn route<F>(&self, url: &str, build: F)
    where
        F: Fn(&mut FakePage) + Send + Sync + 'static,
    {
        self.dom.lock().routes.insert(url.to_string(), Arc::new(build));
    }

    /// Runs `f` against the current window's page.
    pub fn with_page<R>(&self, f: impl FnOnce(&mut FakePage) -> R) -> R {
        f(self.dom.lock().page_mut())
    }

    /// Runs `f` against the whole DOM.
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut FakeDom) -> R) -> R {
        f(&mut self.dom.lock())
    }

    /// Opens `url` in a new window, without switching to it.
    pub fn open_window(&self, url: &str) -> WindowHandle {
        self.dom.lock().open_window(url)
    }

    /// Sets what `document.readyState` reports.
    pub fn set_ready_state(&self, state: &str) {
        self.dom.lock().set_ready_state(state);
    }

    /// Returns the command counters.
    #[must_use]
    pub fn stats(&self) -> FakeStats {
        self.dom.lock().stats
    }

    /// Returns the last node that received a successful click.
    #[must_use]
    pub fn last_clicked(&self) -> Option<ElementId> {
        self.dom.lock().last_clicked.clone()
    }

    fn script_target(args: &[Value]) -> Result<ElementId> {
        args.first()
            .and_then(ElementId::from_script_arg)
            .ok_or_else(|| Error::script_error("arguments[0] is not an element"))
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut dom = self.dom.lock();
        dom.stats.navigations += 1;
        dom.navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.dom.lock().page().url.clone())
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<ElementId>> {
        let mut dom = self.dom.lock();
        dom.stats.finds += 1;
        Ok(dom.page().find(by))
    }

    async fn find_elements_in(&self, parent: &ElementId, by: &By) -> Result<Vec<ElementId>> {
        let dom = self.dom.lock();
        let page = dom.page();
        page.live(parent)?;
        Ok(page.find_in(parent, by))
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.dom.lock().page().is_displayed(element)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        Ok(self.dom.lock().page().live(element)?.enabled)
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        Ok(self.dom.lock().page().live(element)?.selected)
    }

    async fn rect(&self, element: &ElementId) -> Result<Rect> {
        Ok(self.dom.lock().page().live(element)?.rect)
    }

    async fn tag_name(&self, element: &ElementId) -> Result<String> {
        Ok(self.dom.lock().page().live(element)?.tag.clone())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        Ok(self.dom.lock().page().live(element)?.text.clone())
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.dom.lock().click(element, ClickStrategy::Direct)
    }

    async fn pointer_click(&self, element: &ElementId) -> Result<()> {
        self.dom.lock().click(element, ClickStrategy::Gesture)
    }

    async fn execute_script(&self, source: &str, args: Vec<Value>) -> Result<Value> {
        let mut dom = self.dom.lock();
        dom.stats.scripts += 1;

        match source {
            script::SCROLL_INTO_VIEW => {
                let id = Self::script_target(&args)?;
                dom.page().live(&id)?;
                dom.stats.scrolls += 1;
                Ok(Value::Null)
            }
            script::CLICK => {
                let id = Self::script_target(&args)?;
                dom.click(&id, ClickStrategy::Scripted)?;
                Ok(Value::Null)
            }
            script::READY_STATE => Ok(Value::String(dom.ready_state.clone())),
            other => Err(Error::script_error(format!("unsupported script: {other}"))),
        }
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        Ok(self
            .dom
            .lock()
            .windows
            .iter()
            .map(|(handle, _)| handle.clone())
            .collect())
    }

    async fn current_window(&self) -> Result<WindowHandle> {
        let dom = self.dom.lock();
        Ok(dom.windows[dom.current].0.clone())
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let mut dom = self.dom.lock();
        let index = dom
            .windows
            .iter()
            .position(|(h, _)| h == handle)
            .ok_or_else(|| Error::no_such_window(handle.clone()))?;
        dom.current = index;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_navigation_detaches_old_handles() {
        let fake = FakeSession::new("https://example.test/");
        let id = fake.with_page(|page| page.add(By::css("h1"), FakeNode::new("h1")));

        fake.goto("https://example.test/careers/").await.unwrap();

        let err = fake.text(&id).await.unwrap_err();
        assert!(matches!(err, Error::StaleElement { .. }));
        assert!(fake.find_elements(&By::css("h1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_routes_build_pages() {
        let fake = FakeSession::new("about:blank");
        fake.route("https://example.test/", |page| {
            page.add(By::css("footer"), FakeNode::new("footer"));
        });

        fake.goto("https://example.test/").await.unwrap();
        assert_eq!(fake.find_elements(&By::css("footer")).await.unwrap().len(), 1);
        assert_eq!(fake.stats().navigations, 1);
    }

    #[tokio::test]
    async fn test_hidden_parent_hides_children() {
        let fake = FakeSession::new("https://example.test/");
        let child = fake.with_page(|page| {
            let parent = page.add(By::css(".modal"), FakeNode::new("div").hidden());
            page.add_child(&parent, By::css("button"), FakeNode::new("button"))
        });
        assert!(!fake.is_displayed(&child).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_detaches_descendants() {
        let fake = FakeSession::new("https://example.test/");
        let (parent, child) = fake.with_page(|page| {
            let parent = page.add(By::css(".card"), FakeNode::new("div"));
            let child = page.add_child(&parent, By::css("a"), FakeNode::new("a"));
            (parent, child)
        });

        assert!(fake.with_page(|page| page.remove(&parent)));
        assert_err!(fake.tag_name(&child).await);
        assert!(!fake.with_page(|page| page.remove(&parent)));
    }

    #[tokio::test]
    async fn test_injected_failures_run_out() {
        let fake = FakeSession::new("https://example.test/");
        let id = fake.with_page(|page| {
            page.add(
                By::css("#go"),
                FakeNode::new("button").fail_clicks(ClickStrategy::Direct, 1),
            )
        });

        let err = assert_err!(fake.click(&id).await);
        assert!(matches!(err, Error::ClickIntercepted { .. }));
        assert_ok!(fake.click(&id).await);
        assert_eq!(fake.stats().native_clicks, 2);
        assert_eq!(fake.last_clicked(), Some(id));
    }

    #[tokio::test]
    async fn test_unknown_script_is_an_error() {
        let fake = FakeSession::new("https://example.test/");
        let err = fake.execute_script("return 1", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::ScriptError { .. }));
    }

    #[tokio::test]
    async fn test_switch_to_unknown_window() {
        let fake = FakeSession::new("https://example.test/");
        let err = fake
            .switch_to_window(&WindowHandle::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchWindow { .. }));
    }
}
