//! The browser session capability surface.
//!
//! Everything the wait engine does to a browser goes through [`Session`].
//! A real WebDriver connection implements it (feature `webdriver`), and so
//! does the in-memory [`FakeSession`](crate::mock::FakeSession) used by the
//! tests.
//!
//! Sessions are shared as `Arc<dyn Session>`. Exactly one scenario issues
//! commands at a time, so implementations only need interior mutability for
//! their own bookkeeping.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{ElementId, WindowHandle};

use super::selector::By;

// ============================================================================
// Rect
// ============================================================================

/// Rendered bounding box of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the box covers a non-zero area.
    #[inline]
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

// ============================================================================
// Session Trait
// ============================================================================

/// A live browser session.
///
/// Every method reads the browser's *current* state. Element methods fail
/// with [`Error::StaleElement`](crate::Error::StaleElement) once the node
/// behind an [`ElementId`] has been detached. [`click`](Self::click) and
/// [`pointer_click`](Self::pointer_click) fail with
/// [`Error::ClickIntercepted`](crate::Error::ClickIntercepted) when another
/// element receives the click.
#[async_trait]
pub trait Session: Send + Sync {
    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Navigates the current window to `url`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Returns the URL of the current window.
    async fn current_url(&self) -> Result<String>;

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Returns every node matching `by`, in document order.
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementId>>;

    /// Returns every descendant of `parent` matching `by`.
    async fn find_elements_in(&self, parent: &ElementId, by: &By) -> Result<Vec<ElementId>>;

    /// Returns `true` if the element is rendered and not hidden by style.
    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    /// Returns `true` if the element is not disabled.
    async fn is_enabled(&self, element: &ElementId) -> Result<bool>;

    /// Returns `true` if the option, checkbox or radio is selected.
    async fn is_selected(&self, element: &ElementId) -> Result<bool>;

    /// Returns the element's rendered bounding box.
    async fn rect(&self, element: &ElementId) -> Result<Rect>;

    /// Returns the element's lowercase tag name.
    async fn tag_name(&self, element: &ElementId) -> Result<String>;

    /// Returns the element's rendered text.
    async fn text(&self, element: &ElementId) -> Result<String>;

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Clicks the element through the driver's native click.
    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Moves the pointer to the element's center and presses the left button.
    async fn pointer_click(&self, element: &ElementId) -> Result<()>;

    /// Executes synchronous JavaScript in the page.
    ///
    /// Element arguments are passed as W3C references built by
    /// [`ElementId::to_script_arg`].
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    // ------------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------------

    /// Returns the handles of every open top-level window.
    async fn window_handles(&self) -> Result<Vec<WindowHandle>>;

    /// Returns the handle of the window receiving commands.
    async fn current_window(&self) -> Result<WindowHandle>;

    /// Makes `handle` the window receiving commands.
    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
