//! Error types for the wait and retry engine.
//!
//! Every fallible operation returns [`Result<T>`] which uses [`Error`].
//!
//! # Usage
//!
//! ```ignore
//! use careers_e2e::{By, Result, Waits};
//!
//! async fn example(waits: &Waits) -> Result<()> {
//!     let button = waits.clickable(&By::css("#submit")).await?;
//!     button.click().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Synchronization | [`Error::Timeout`] |
//! | Transient | [`Error::StaleElement`], [`Error::ClickIntercepted`] |
//! | Element | [`Error::ElementNotFound`], [`Error::OptionNotFound`] |
//! | Interaction | [`Error::ClickExhausted`] |
//! | Session | [`Error::NoSuchWindow`], [`Error::ScriptError`], [`Error::SessionClosed`], [`Error::Connection`], [`Error::WebDriver`] |
//! | Scenario | [`Error::Assertion`], [`Error::Config`], [`Error::InvalidArgument`] |
//! | External | [`Error::Json`], [`Error::Url`] |
//!
//! Only the transient category is ever absorbed by the engine: the poller keeps
//! polling through it and the click helpers spend retry budget on it. Anything
//! else surfaces to the caller unchanged.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;
use std::time::Duration;

use thiserror::Error;

use crate::identifiers::{ElementId, WindowHandle};
use crate::waits::ClickStrategy;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// TransientKind
// ============================================================================

/// The failure kinds that are recovered locally instead of surfacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientKind {
    /// A resolved handle no longer backs a live node.
    Stale,
    /// Another element received the click.
    Intercepted,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale => f.write_str("stale element"),
            Self::Intercepted => f.write_str("click intercepted"),
        }
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Synchronization Errors
    // ========================================================================
    /// A condition never became true within its budget.
    #[error("Timeout after {elapsed_ms}ms (budget {timeout_ms}ms) waiting for {operation}")]
    Timeout {
        /// Description of the condition that was polled.
        operation: String,
        /// Configured budget in milliseconds.
        timeout_ms: u64,
        /// Wall-clock time actually spent polling.
        elapsed_ms: u64,
    },

    // ========================================================================
    // Transient Errors
    // ========================================================================
    /// Element is stale (its node was replaced or removed).
    #[error("Stale element: {element_id}")]
    StaleElement {
        /// The stale element's ID.
        element_id: ElementId,
    },

    /// The click landed on another element.
    #[error("Click on {element_id} intercepted: {message}")]
    ClickIntercepted {
        /// The element that was meant to receive the click.
        element_id: ElementId,
        /// Driver-provided detail, usually naming the occluding element.
        message: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// A locator matched nothing where a match was assumed.
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Locator that was used.
        selector: String,
    },

    /// A select or popup never offered the requested option.
    #[error("Option '{option}' not found in {selector}")]
    OptionNotFound {
        /// Locator of the select control.
        selector: String,
        /// Visible text that was requested.
        option: String,
    },

    // ========================================================================
    // Interaction Errors
    // ========================================================================
    /// Click retries (and every click strategy) were used up.
    #[error(
        "Failed to click {target} after {attempts} attempts ({kind}); strategies tried: {}",
        format_strategies(.tried)
    )]
    ClickExhausted {
        /// Description of the click target.
        target: String,
        /// Attempt rounds spent.
        attempts: u32,
        /// Kind of the last transient failure.
        kind: TransientKind,
        /// Strategies tried, in first-use order.
        tried: Vec<ClickStrategy>,
        /// The last failure observed.
        #[source]
        source: Box<Error>,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Window handle does not exist.
    #[error("No such window: {handle}")]
    NoSuchWindow {
        /// The missing window handle.
        handle: WindowHandle,
    },

    /// JavaScript execution error.
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message from script execution.
        message: String,
    },

    /// The browser session is gone.
    #[error("Session closed")]
    SessionClosed,

    /// Could not reach the WebDriver endpoint.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Any other WebDriver protocol failure.
    #[error("WebDriver error: {message}")]
    WebDriver {
        /// Driver-provided message.
        message: String,
    },

    // ========================================================================
    // Scenario Errors
    // ========================================================================
    /// A scenario step observed the wrong state.
    #[error("Step '{step}' failed: {message}")]
    Assertion {
        /// Name of the scenario step.
        step: String,
        /// What was expected and what was observed.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to an engine operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

fn format_strategies(tried: &[ClickStrategy]) -> String {
    tried
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, budget: Duration, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: budget.as_millis() as u64,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElement { element_id }
    }

    /// Creates a click intercepted error.
    #[inline]
    pub fn click_intercepted(element_id: ElementId, message: impl Into<String>) -> Self {
        Self::ClickIntercepted {
            element_id,
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Creates an option not found error.
    #[inline]
    pub fn option_not_found(selector: impl Into<String>, option: impl Into<String>) -> Self {
        Self::OptionNotFound {
            selector: selector.into(),
            option: option.into(),
        }
    }

    /// Creates a click exhausted error.
    #[inline]
    pub fn click_exhausted(
        target: impl Into<String>,
        attempts: u32,
        kind: TransientKind,
        tried: Vec<ClickStrategy>,
        source: Error,
    ) -> Self {
        Self::ClickExhausted {
            target: target.into(),
            attempts,
            kind,
            tried,
            source: Box::new(source),
        }
    }

    /// Creates a no such window error.
    #[inline]
    pub fn no_such_window(handle: WindowHandle) -> Self {
        Self::NoSuchWindow { handle }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a generic WebDriver error.
    #[inline]
    pub fn webdriver(message: impl Into<String>) -> Self {
        Self::WebDriver {
            message: message.into(),
        }
    }

    /// Creates an assertion error for a scenario step.
    #[inline]
    pub fn assertion(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Assertion {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the transient kind, if this failure is recovered locally.
    #[inline]
    #[must_use]
    pub fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            Self::StaleElement { .. } => Some(TransientKind::Stale),
            Self::ClickIntercepted { .. } => Some(TransientKind::Intercepted),
            _ => None,
        }
    }

    /// Returns `true` if this error may go away on its own.
    ///
    /// Only staleness and click interception qualify. A dead session or a
    /// script error is never retried.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient_kind().is_some()
    }

    /// Returns `true` if this is an element error.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::StaleElement { .. }
                | Self::ClickIntercepted { .. }
                | Self::OptionNotFound { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
