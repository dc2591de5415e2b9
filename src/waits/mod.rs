//! Bounded-time synchronization and retry engine.
//!
//! [`Waits`] polls [`Condition`]s against a live [`Session`] until they hold
//! or their budget elapses, and layers click, select and overlay helpers on
//! top of that primitive.
//!
//! | Layer | Items |
//! |-------|-------|
//! | Poller | [`Waits::until`], [`Waits::until_within`], [`Waits::probe`] |
//! | Readiness queries | [`conditions`], [`Waits::wait_for`], [`ConditionKind`] |
//! | Interaction helpers | [`Waits::perform_click`], [`Waits::select_option`], [`Waits::dismiss_overlay`] |
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use careers_e2e::{By, WaitOptions, Waits};
//!
//! let waits = Waits::with_options(session, WaitOptions::new().with_timeout(Duration::from_secs(15)));
//!
//! waits.invisible(&By::css("[class*='loading']")).await?;
//! waits.click_with_retry(&By::xpath("//a[normalize-space()='See all QA jobs']"), 3).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod click;
mod condition;
pub mod conditions;
mod overlay;
mod poll;
mod select;
mod windows;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::browser::{Element, Session};
use crate::identifiers::ElementId;

// ============================================================================
// Re-exports
// ============================================================================

pub use click::{ClickStrategy, ClickTarget, FALLBACK_CHAIN, RetryBudget};
pub use condition::{Condition, ProbeFuture, boxed_probe};
pub use overlay::{DEFAULT_PROBE_TIMEOUT, Dismissal, Overlay};
pub use poll::{ConditionKind, WaitOutcome};
pub use select::DEFAULT_POPUP_OPTIONS;

// ============================================================================
// Constants
// ============================================================================

/// Default budget for a single wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default delay between two evaluations of a condition.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Shortest delay the poller sleeps between evaluations.
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// WaitOptions
// ============================================================================

/// Timing configuration for a [`Waits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Budget applied when a call does not pass its own.
    pub timeout: Duration,

    /// Delay between two evaluations of a condition.
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitOptions {
    /// Creates options with the default timeout and poll interval.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the default budget.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between evaluations.
    ///
    /// Intervals below one millisecond are raised to one millisecond.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

// ============================================================================
// Waits
// ============================================================================

/// The synchronization engine bound to one session.
///
/// Cloning is cheap and shares the session.
#[derive(Clone)]
pub struct Waits {
    session: Arc<dyn Session>,
    options: WaitOptions,
}

impl fmt::Debug for Waits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waits")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Waits {
    /// Creates an engine with default options.
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self::with_options(session, WaitOptions::default())
    }

    /// Creates an engine with the given options.
    pub fn with_options(session: Arc<dyn Session>, options: WaitOptions) -> Self {
        Self { session, options }
    }

    /// Returns a copy of this engine whose default budget is `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            session: Arc::clone(&self.session),
            options: self.options.with_timeout(timeout),
        }
    }

    /// Returns the session this engine drives.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Returns the timing options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> WaitOptions {
        self.options
    }

    /// Returns the default budget.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.options.timeout
    }

    /// Wraps a raw reference into an [`Element`] on this session.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Element {
        Element::new(id, Arc::clone(&self.session))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeSession;

    #[test]
    fn test_wait_options_defaults() {
        let options = WaitOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(15));
        assert_eq!(options.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_wait_options_builder() {
        let options = WaitOptions::new()
            .with_timeout(Duration::from_secs(60))
            .with_poll_interval(Duration::from_millis(100));
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_with_timeout_keeps_interval() {
        let fake = FakeSession::new("https://example.test/");
        let waits = Waits::with_options(
            fake,
            WaitOptions::new().with_poll_interval(Duration::from_millis(50)),
        );
        let extended = waits.with_timeout(Duration::from_secs(60));

        assert_eq!(extended.timeout(), Duration::from_secs(60));
        assert_eq!(extended.options().poll_interval, Duration::from_millis(50));
        assert_eq!(waits.timeout(), DEFAULT_TIMEOUT);
    }
}
