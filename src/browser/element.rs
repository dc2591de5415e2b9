//! DOM element handles.
//!
//! An [`Element`] pairs an [`ElementId`] with the session it was resolved
//! from. It is a point-in-time reference: after the page re-renders, every
//! operation on it fails with [`Error::StaleElement`], and callers recover by
//! resolving the locator again.
//!
//! # Example
//!
//! ```ignore
//! let header = waits.visible(&By::css("header")).await?;
//!
//! header.scroll_into_view().await?;
//! let text = header.text().await?;
//! header.click().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;

use super::script;
use super::selector::By;
use super::session::{Rect, Session};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for an element.
pub(crate) struct ElementInner {
    /// This element's reference.
    pub id: ElementId,

    /// Session the element was resolved from.
    pub session: Arc<dyn Session>,
}

// ============================================================================
// Element
// ============================================================================

/// A handle to a DOM node in the live session.
///
/// Cloning is cheap; clones refer to the same node.
#[derive(Clone)]
pub struct Element {
    /// Shared inner state.
    pub(crate) inner: Arc<ElementInner>,
}

// ============================================================================
// Element - Display
// ============================================================================

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Element {}

// ============================================================================
// Element - Constructor
// ============================================================================

impl Element {
    /// Creates a new element handle.
    pub fn new(id: ElementId, session: Arc<dyn Session>) -> Self {
        Self {
            inner: Arc::new(ElementInner { id, session }),
        }
    }
}

// ============================================================================
// Element - Accessors
// ============================================================================

impl Element {
    /// Returns this element's reference.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.inner.id
    }

    /// Returns the session this element belongs to.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.inner.session
    }
}

// ============================================================================
// Element - Actions
// ============================================================================

impl Element {
    /// Clicks the element through the driver's native click.
    pub async fn click(&self) -> Result<()> {
        debug!(element_id = %self.inner.id, "Clicking element");
        self.inner.session.click(&self.inner.id).await
    }

    /// Clicks the element by dispatching `element.click()` from script.
    pub async fn js_click(&self) -> Result<()> {
        debug!(element_id = %self.inner.id, "Clicking element via script");
        self.inner
            .session
            .execute_script(script::CLICK, vec![self.inner.id.to_script_arg()])
            .await?;
        Ok(())
    }

    /// Moves the pointer onto the element and clicks.
    pub async fn pointer_click(&self) -> Result<()> {
        debug!(element_id = %self.inner.id, "Clicking element via pointer gesture");
        self.inner.session.pointer_click(&self.inner.id).await
    }
}

// ============================================================================
// Element - Properties
// ============================================================================

impl Element {
    /// Gets the element's rendered text.
    pub async fn text(&self) -> Result<String> {
        self.inner.session.text(&self.inner.id).await
    }

    /// Gets the element's lowercase tag name.
    pub async fn tag_name(&self) -> Result<String> {
        self.inner.session.tag_name(&self.inner.id).await
    }

    /// Checks if the element is displayed.
    pub async fn is_displayed(&self) -> Result<bool> {
        self.inner.session.is_displayed(&self.inner.id).await
    }

    /// Checks if the element is enabled.
    pub async fn is_enabled(&self) -> Result<bool> {
        self.inner.session.is_enabled(&self.inner.id).await
    }

    /// Checks if the option, checkbox or radio is selected.
    pub async fn is_selected(&self) -> Result<bool> {
        self.inner.session.is_selected(&self.inner.id).await
    }

    /// Gets the element's bounding rectangle.
    pub async fn rect(&self) -> Result<Rect> {
        self.inner.session.rect(&self.inner.id).await
    }

    /// Returns `true` if the element is displayed with a non-zero box.
    pub async fn is_visible(&self) -> Result<bool> {
        Ok(self.is_displayed().await? && self.rect().await?.has_area())
    }
}

// ============================================================================
// Element - Scroll
// ============================================================================

impl Element {
    /// Scrolls the element to the center of the viewport.
    pub async fn scroll_into_view(&self) -> Result<()> {
        debug!(element_id = %self.inner.id, "Scrolling element into view");
        self.inner
            .session
            .execute_script(script::SCROLL_INTO_VIEW, vec![self.inner.id.to_script_arg()])
            .await?;
        Ok(())
    }
}

// ============================================================================
// Element - Nested Search
// ============================================================================

impl Element {
    /// Finds the first descendant matching `by`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementNotFound`] if nothing matches.
    pub async fn find_element(&self, by: &By) -> Result<Element> {
        self.find_elements(by)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found(format!("{} within {}", by, self.inner.id)))
    }

    /// Finds every descendant matching `by`.
    pub async fn find_elements(&self, by: &By) -> Result<Vec<Element>> {
        let ids = self
            .inner
            .session
            .find_elements_in(&self.inner.id, by)
            .await?;

        Ok(ids
            .into_iter()
            .map(|id| Element::new(id, Arc::clone(&self.inner.session)))
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
