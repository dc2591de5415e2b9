//! Click helpers with retry and strategy fallback.
//!
//! A click goes through up to three code paths, tried in order:
//!
//! | Strategy | Precondition | Action |
//! |----------|--------------|--------|
//! | [`ClickStrategy::Direct`] | clickable | native driver click |
//! | [`ClickStrategy::Scripted`] | visible | `element.click()` from script |
//! | [`ClickStrategy::Gesture`] | clickable | pointer move, press, release |
//!
//! Some overlays block one path but not another. Each attempt re-resolves the
//! target, scrolls it into view and acts. A transient failure (stale handle,
//! intercepted click) moves on to the next strategy; running off the end of
//! the chain starts a new round until the [`RetryBudget`] is spent. Anything
//! else, including a precondition that times out, fails the click at once.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, warn};

use crate::browser::{By, Element};
use crate::error::{Error, Result, TransientKind};

use super::Waits;
use super::condition::Condition;
use super::conditions;

// ============================================================================
// ClickStrategy
// ============================================================================

/// A code path for delivering a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickStrategy {
    /// The driver's native element click.
    Direct,
    /// `element.click()` dispatched from page script.
    Scripted,
    /// A simulated pointer move-and-click.
    Gesture,
}

impl fmt::Display for ClickStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Scripted => f.write_str("scripted"),
            Self::Gesture => f.write_str("gesture"),
        }
    }
}

/// Direct first, then scripted, then gesture.
pub const FALLBACK_CHAIN: [ClickStrategy; 3] = [
    ClickStrategy::Direct,
    ClickStrategy::Scripted,
    ClickStrategy::Gesture,
];

// ============================================================================
// RetryBudget
// ============================================================================

/// Number of attempt rounds an interaction may spend.
///
/// Never less than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Default number of rounds.
    pub const DEFAULT: Self = Self(3);

    /// A single round, no retries.
    pub const ONCE: Self = Self(1);

    /// Creates a budget of `attempts` rounds, raised to at least one.
    #[inline]
    #[must_use]
    pub const fn new(attempts: u32) -> Self {
        if attempts == 0 { Self(1) } else { Self(attempts) }
    }

    /// Returns the number of rounds.
    #[inline]
    #[must_use]
    pub const fn attempts(self) -> u32 {
        self.0
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for RetryBudget {
    fn from(attempts: u32) -> Self {
        Self::new(attempts)
    }
}

// ============================================================================
// ClickTarget
// ============================================================================

/// What to click, as a pair of re-evaluable resolvers.
///
/// `clickable` gates the direct and gesture paths, `visible` gates the
/// scripted one. Both are evaluated fresh for every attempt.
pub struct ClickTarget {
    description: String,
    clickable: Condition<Element>,
    visible: Condition<Element>,
    scroll: bool,
}

impl fmt::Debug for ClickTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickTarget")
            .field("description", &self.description)
            .field("scroll", &self.scroll)
            .finish_non_exhaustive()
    }
}

impl ClickTarget {
    /// Creates a target from explicit resolvers.
    pub fn new(
        description: impl Into<String>,
        clickable: Condition<Element>,
        visible: Condition<Element>,
    ) -> Self {
        Self {
            description: description.into(),
            clickable,
            visible,
            scroll: true,
        }
    }

    /// The first node matching `by`.
    pub fn located(by: &By) -> Self {
        Self::new(
            by.to_string(),
            conditions::clickability_of(by),
            conditions::visibility_of(by),
        )
    }

    /// The first descendant of `container` matching `by`.
    pub fn within(container: &Element, by: &By) -> Self {
        Self::new(
            format!("{by} within {}", container.id()),
            conditions::clickability_within(container, by),
            conditions::visibility_within(container, by),
        )
    }

    /// An element resolved earlier.
    ///
    /// The handle cannot be re-resolved: once its node is replaced, every
    /// precondition wait on it runs out its budget. Prefer [`located`] or
    /// [`within`] for anything that may re-render.
    ///
    /// [`located`]: Self::located
    /// [`within`]: Self::within
    pub fn element(element: &Element) -> Self {
        Self::new(
            format!("element {}", element.id()),
            conditions::clickability_of_element(element),
            conditions::visibility_of_element(element),
        )
    }

    /// Clicks where the node already is, without scrolling it into view first.
    ///
    /// For pages whose layout reacts to scrolling, such as sticky headers
    /// that cover the node once it moves.
    #[must_use]
    pub fn without_scroll(mut self) -> Self {
        self.scroll = false;
        self
    }

    /// Returns the description used in logs and errors.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    fn precondition(&self, strategy: ClickStrategy) -> &Condition<Element> {
        match strategy {
            ClickStrategy::Scripted => &self.visible,
            ClickStrategy::Direct | ClickStrategy::Gesture => &self.clickable,
        }
    }
}

// ============================================================================
// Attempt
// ============================================================================

/// Outcome of one strategy attempt.
#[derive(Debug)]
enum Attempt<T> {
    Success(T),
    Recoverable { kind: TransientKind, error: Error },
    Fatal(Error),
}

impl<T> From<Result<T>> for Attempt<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => match error.transient_kind() {
                Some(kind) => Self::Recoverable { kind, error },
                None => Self::Fatal(error),
            },
        }
    }
}

// ============================================================================
// Waits - Click Engine
// ============================================================================

impl Waits {
    /// Clicks `target`, walking `strategies` in order each round.
    ///
    /// A stale handle is re-resolved and the same strategy retried, up to the
    /// budget's attempt count. An intercepted click moves on to the next
    /// strategy. Returns the strategy that delivered the click.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `strategies` is empty.
    /// - [`Error::ClickExhausted`] once every round ended in transient
    ///   failures. It names the last failure kind, the rounds spent and the
    ///   strategies tried.
    /// - Any non-transient error (a precondition [`Error::Timeout`], a dead
    ///   session) as soon as it happens.
    pub async fn perform_click(
        &self,
        target: &ClickTarget,
        strategies: &[ClickStrategy],
        budget: RetryBudget,
    ) -> Result<ClickStrategy> {
        if strategies.is_empty() {
            return Err(Error::invalid_argument(format!(
                "no click strategies given for {}",
                target.description
            )));
        }

        let mut tried: Vec<ClickStrategy> = Vec::with_capacity(strategies.len());
        let mut last: Option<(TransientKind, Error)> = None;

        for round in 1..=budget.attempts() {
            for &strategy in strategies {
                if !tried.contains(&strategy) {
                    tried.push(strategy);
                }

                // A stale handle is re-resolved and the same strategy tried again.
                // Interception, or staleness past the budget, moves down the chain.
                for retry in 1..=budget.attempts() {
                    debug!(
                        click_target = %target.description,
                        %strategy,
                        round,
                        retry,
                        "Attempting click"
                    );

                    match self.attempt_click(target, strategy).await {
                        Attempt::Success(()) => {
                            debug!(click_target = %target.description, %strategy, round, "Click delivered");
                            return Ok(strategy);
                        }
                        Attempt::Recoverable { kind, error } => {
                            let reresolve = kind == TransientKind::Stale && retry < budget.attempts();
                            debug!(
                                click_target = %target.description,
                                %strategy,
                                round,
                                %kind,
                                reresolve,
                                "Click failed"
                            );
                            last = Some((kind, error));
                            if !reresolve {
                                break;
                            }
                        }
                        Attempt::Fatal(error) => return Err(error),
                    }
                }
            }
        }

        let attempts = budget.attempts();
        warn!(click_target = %target.description, attempts, "Click retries exhausted");

        match last {
            Some((kind, error)) => Err(Error::click_exhausted(
                target.description.clone(),
                attempts,
                kind,
                tried,
                error,
            )),
            // A non-empty chain always records a failure before getting here.
            None => Err(Error::invalid_argument(format!(
                "click on {} made no attempt",
                target.description
            ))),
        }
    }

    async fn attempt_click(&self, target: &ClickTarget, strategy: ClickStrategy) -> Attempt<()> {
        let element = match self.until(target.precondition(strategy)).await {
            Ok(element) => element,
            Err(error) => return Attempt::Fatal(error),
        };
        Attempt::from(Self::deliver(&element, strategy, target.scroll).await)
    }

    async fn deliver(element: &Element, strategy: ClickStrategy, scroll: bool) -> Result<()> {
        if scroll {
            element.scroll_into_view().await?;
        }
        match strategy {
            ClickStrategy::Direct => element.click().await,
            ClickStrategy::Scripted => element.js_click().await,
            ClickStrategy::Gesture => element.pointer_click().await,
        }
    }
}

// ============================================================================
// Waits - Click Shorthands
// ============================================================================

impl Waits {
    /// Direct click, retried on staleness and interception.
    ///
    /// Every attempt waits for clickability, scrolls into view and clicks.
    /// Exactly `max_attempts` attempts are made when each one is intercepted.
    pub async fn click_with_retry(&self, by: &By, max_attempts: u32) -> Result<()> {
        self.perform_click(
            &ClickTarget::located(by),
            &[ClickStrategy::Direct],
            RetryBudget::new(max_attempts),
        )
        .await?;
        Ok(())
    }

    /// Waits for clickability, scrolls into view and clicks once.
    pub async fn click_with_scroll(&self, by: &By) -> Result<()> {
        let element = self.clickable(by).await?;
        element.scroll_into_view().await?;
        let element = self.clickable_element(&element).await?;
        element.click().await
    }

    /// Waits for visibility, scrolls into view and clicks from script.
    pub async fn js_click(&self, by: &By) -> Result<()> {
        let element = self.visible(by).await?;
        element.scroll_into_view().await?;
        element.js_click().await
    }

    /// Waits for clickability, scrolls into view and clicks with a pointer gesture.
    pub async fn action_click(&self, by: &By) -> Result<()> {
        let element = self.clickable(by).await?;
        element.scroll_into_view().await?;
        element.pointer_click().await
    }

    /// Clicks through the full [`FALLBACK_CHAIN`] with the default budget.
    pub async fn click_with_fallback(&self, by: &By) -> Result<ClickStrategy> {
        self.perform_click(&ClickTarget::located(by), &FALLBACK_CHAIN, RetryBudget::DEFAULT)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
