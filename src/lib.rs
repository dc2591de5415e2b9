//! Careers E2E - browser end-to-end test for a recruiting site.
//!
//! The interesting part is not the scenario but the engine under it: every
//! interaction with a dynamic page goes through a bounded-time wait and retry
//! core that tolerates late rendering, detached nodes and intercepted clicks.
//!
//! # Architecture
//!
//! - **Session** ([`browser::Session`]): the only way to talk to a browser.
//!   Implemented over W3C WebDriver (feature `webdriver`) and in memory
//!   ([`mock::FakeSession`]).
//! - **Waits** ([`Waits`]): condition poller, readiness queries, click retry
//!   with a three-tier fallback, select-from-list, overlay dismissal.
//! - **Pages** ([`pages`]): facades owning the site's locators.
//! - **Scenario** ([`scenario`]): the QA jobs flow, step by step.
//!
//! Key design principles:
//!
//! - Every wait has a hard deadline and reports what it waited for
//! - Only stale elements and intercepted clicks are retried
//! - Elements are re-resolved from their locator on every attempt
//!
//! # Quick Start
//!
//! ```ignore
//! use careers_e2e::browser::WebDriverSession;
//! use careers_e2e::{QaJobsFlow, Result, ScenarioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ScenarioConfig::from_env()?;
//!     let session = WebDriverSession::connect(config.webdriver_url()).await?;
//!
//!     let report = QaJobsFlow::new(session.clone(), config).run().await?;
//!     println!("{} QA jobs, first: {}", report.job_count, report.first_job_title);
//!
//!     session.close().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | [`Session`] trait, [`By`], [`Element`] |
//! | [`waits`] | [`Waits`], [`Condition`], click, select and overlay helpers |
//! | [`pages`] | Page facades |
//! | [`scenario`] | [`ScenarioConfig`], [`QaJobsFlow`], [`FlowReport`] |
//! | [`mock`] | In-memory [`Session`] for tests |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//!
//! # Logging
//!
//! The crate emits `tracing` events and installs no subscriber. Run with
//! `RUST_LOG=careers_e2e=debug` under a subscriber to watch waits and click
//! fallbacks as they happen.

// ============================================================================
// Modules
// ============================================================================

/// Browser session surface: Session, By, Element.
///
/// - [`Session`] - Capability trait over a live browser
/// - [`By`] - Element locator
/// - [`Element`] - DOM element handle
pub mod browser;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for browser entities.
pub mod identifiers;

/// In-memory browser session for tests.
pub mod mock;

/// Page facades for the recruiting site.
pub mod pages;

/// The QA jobs end-to-end scenario.
pub mod scenario;

/// Bounded-time waits and resilient interactions.
///
/// Use [`Waits::new()`] over any [`Session`].
pub mod waits;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{By, Element, Rect, Session};

// Error types
pub use error::{Error, Result, TransientKind};

// Identifier types
pub use identifiers::{ElementId, WindowHandle};

// Scenario types
pub use scenario::{FlowReport, QaJobsFlow, ScenarioConfig, ScenarioConfigBuilder};

// Wait types
pub use waits::{
    ClickStrategy, ClickTarget, Condition, Dismissal, Overlay, RetryBudget, WaitOptions, Waits,
};
