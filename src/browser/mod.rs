//! Browser session surface.
//!
//! This module provides the types every wait and page object is built on:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Capability trait over a live browser session |
//! | [`By`] | Locator: strategy plus value |
//! | [`Element`] | Handle to a DOM node resolved in a session |
//! | [`Rect`] | Rendered bounding box |
//!
//! # Example
//!
//! ```ignore
//! use careers_e2e::browser::{By, Element, Session};
//!
//! let ids = session.find_elements(&By::css("header")).await?;
//! let header = Element::new(ids[0].clone(), session.clone());
//! assert!(header.is_visible().await?);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// DOM element handles.
pub mod element;

/// Scripts run through [`Session::execute_script`].
pub mod script;

/// Element locators.
pub mod selector;

/// The session capability trait.
pub mod session;

/// W3C WebDriver adapter.
#[cfg(feature = "webdriver")]
pub mod webdriver;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::Element;
pub use selector::{By, xpath_literal};
pub use session::{Rect, Session};

#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverSession;
