//! The condition poller and the named readiness waits built on it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, trace};

use crate::browser::{By, Element};
use crate::error::{Error, Result};

use super::condition::Condition;
use super::conditions;
use super::{MIN_POLL_INTERVAL, Waits};

// ============================================================================
// ConditionKind / WaitOutcome
// ============================================================================

/// Readiness query selector for [`Waits::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// At least one node matches.
    Presence,
    /// The first match is displayed with a non-zero box.
    Visibility,
    /// Nothing visible matches.
    Invisibility,
    /// The first match is visible and enabled.
    Clickability,
    /// More than `n` nodes match.
    CountMoreThan(usize),
    /// Every match is visible (and there is at least one).
    AllVisible,
}

/// Value produced by [`Waits::wait_for`].
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// A single resolved element.
    Element(Element),
    /// Every resolved element.
    Elements(Vec<Element>),
    /// A boolean readiness result.
    Satisfied(bool),
}

impl WaitOutcome {
    /// Returns the single element, if this outcome carries one.
    #[must_use]
    pub fn into_element(self) -> Option<Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the elements, if this outcome carries a list.
    #[must_use]
    pub fn into_elements(self) -> Option<Vec<Element>> {
        match self {
            Self::Elements(elements) => Some(elements),
            _ => None,
        }
    }

    /// Returns `true` for an element, a non-empty list or `Satisfied(true)`.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        match self {
            Self::Element(_) => true,
            Self::Elements(elements) => !elements.is_empty(),
            Self::Satisfied(value) => *value,
        }
    }
}

// ============================================================================
// Waits - Poller
// ============================================================================

impl Waits {
    /// Polls `condition` under the default budget.
    pub async fn until<T: Send + 'static>(&self, condition: &Condition<T>) -> Result<T> {
        self.until_within(condition, self.options.timeout).await
    }

    /// Polls `condition` until it yields a value or `budget` elapses.
    ///
    /// Every evaluation is cut off at the deadline, the pause between
    /// evaluations is clamped to it, and a last evaluation runs once the
    /// deadline is reached. Transient failures (stale element, intercepted
    /// click) count as "not yet"; every other error is returned at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the budget elapses unsatisfied.
    pub async fn until_within<T: Send + 'static>(
        &self,
        condition: &Condition<T>,
        budget: Duration,
    ) -> Result<T> {
        let started = Instant::now();
        let deadline = deadline_after(started, budget);
        let mut attempts: u32 = 0;

        debug!(
            condition = %condition.description(),
            timeout_ms = budget.as_millis() as u64,
            "Waiting for condition"
        );

        loop {
            attempts += 1;

            match timeout_at(deadline, condition.evaluate(Arc::clone(&self.session))).await {
                Ok(Ok(Some(value))) => {
                    debug!(
                        condition = %condition.description(),
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Condition satisfied"
                    );
                    return Ok(value);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) if e.is_transient() => {
                    trace!(condition = %condition.description(), error = %e, "Transient failure while polling");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => break,
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let interval = self.options.poll_interval.max(MIN_POLL_INTERVAL);
            sleep_until(deadline_after(now, interval).min(deadline)).await;
        }

        let elapsed = started.elapsed();
        debug!(
            condition = %condition.description(),
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "Condition timed out"
        );
        Err(Error::timeout(condition.description(), budget, elapsed))
    }

    /// Evaluates `condition` exactly once.
    ///
    /// Transient failures read as `None`.
    pub async fn probe<T: Send + 'static>(&self, condition: &Condition<T>) -> Result<Option<T>> {
        match condition.evaluate(Arc::clone(&self.session)).await {
            Err(e) if e.is_transient() => Ok(None),
            other => other,
        }
    }

    /// Returns whether `condition` holds right now.
    pub async fn is_satisfied<T: Send + 'static>(&self, condition: &Condition<T>) -> Result<bool> {
        Ok(self.probe(condition).await?.is_some())
    }

    /// Runs the readiness query `kind` for `by` under `budget`.
    pub async fn wait_for(&self, kind: ConditionKind, by: &By, budget: Duration) -> Result<WaitOutcome> {
        let outcome = match kind {
            ConditionKind::Presence => {
                WaitOutcome::Element(self.until_within(&conditions::presence_of(by), budget).await?)
            }
            ConditionKind::Visibility => {
                WaitOutcome::Element(self.until_within(&conditions::visibility_of(by), budget).await?)
            }
            ConditionKind::Clickability => {
                WaitOutcome::Element(self.until_within(&conditions::clickability_of(by), budget).await?)
            }
            ConditionKind::Invisibility => {
                WaitOutcome::Satisfied(self.until_within(&conditions::invisibility_of(by), budget).await?)
            }
            ConditionKind::CountMoreThan(count) => WaitOutcome::Satisfied(
                self.until_within(&conditions::count_more_than(by, count), budget)
                    .await?,
            ),
            ConditionKind::AllVisible => {
                WaitOutcome::Elements(self.until_within(&conditions::all_visible(by), budget).await?)
            }
        };
        Ok(outcome)
    }
}

// ============================================================================
// Waits - Readiness Shorthands
// ============================================================================

impl Waits {
    /// Waits until at least one node matches `by`.
    pub async fn present(&self, by: &By) -> Result<Element> {
        self.until(&conditions::presence_of(by)).await
    }

    /// Waits until the first match of `by` is visible.
    pub async fn visible(&self, by: &By) -> Result<Element> {
        self.until(&conditions::visibility_of(by)).await
    }

    /// Waits until `element` is visible.
    pub async fn visible_element(&self, element: &Element) -> Result<Element> {
        self.until(&conditions::visibility_of_element(element)).await
    }

    /// Waits until every match of `by` is visible.
    pub async fn all_visible(&self, by: &By) -> Result<Vec<Element>> {
        self.until(&conditions::all_visible(by)).await
    }

    /// Waits until the first match of `by` is visible and enabled.
    pub async fn clickable(&self, by: &By) -> Result<Element> {
        self.until(&conditions::clickability_of(by)).await
    }

    /// Waits until `element` is visible and enabled.
    pub async fn clickable_element(&self, element: &Element) -> Result<Element> {
        self.until(&conditions::clickability_of_element(element)).await
    }

    /// Waits until nothing visible matches `by`.
    pub async fn invisible(&self, by: &By) -> Result<bool> {
        self.until(&conditions::invisibility_of(by)).await
    }

    /// Waits until `element` is hidden or detached.
    pub async fn invisible_element(&self, element: &Element) -> Result<bool> {
        self.until(&conditions::invisibility_of_element(element)).await
    }

    /// Waits until more than `count` nodes match `by`.
    pub async fn count_more_than(&self, by: &By, count: usize) -> Result<bool> {
        self.until(&conditions::count_more_than(by, count)).await
    }

    /// Waits until the current URL contains `fragment`; returns the URL.
    pub async fn url_contains(&self, fragment: &str) -> Result<String> {
        self.until(&conditions::url_contains(fragment)).await
    }

    /// Waits until `document.readyState` is `complete`.
    pub async fn document_ready(&self) -> Result<()> {
        self.until(&conditions::document_ready()).await
    }
}

/// Roughly 30 years, the horizon of an unbounded wait.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + budget`, saturating at [`FAR_FUTURE`] instead of overflowing.
fn deadline_after(start: Instant, budget: Duration) -> Instant {
    start
        .checked_add(budget.min(FAR_FUTURE))
        .unwrap_or(start)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Session;
    use crate::identifiers::ElementId;
    use crate::mock::{FakeNode, FakeSession};
    use crate::waits::{WaitOptions, boxed_probe};

    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const URL: &str = "https://example.test/";

    fn waits_for(fake: &Arc<FakeSession>) -> Waits {
        Waits::new(fake.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_more_than_flips_mid_poll() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);
        let jobs = By::css(".job");

        assert!(!waits.is_satisfied(&conditions::count_more_than(&jobs, 0)).await.unwrap());

        let writer = fake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            writer.with_page(|page| page.add(By::css(".job"), FakeNode::new("div")));
        });

        let started = Instant::now();
        assert!(waits.count_more_than(&jobs, 0).await.unwrap());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600));
        assert!(elapsed <= Duration::from_millis(600) + waits.options().poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_description_and_budget() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);

        let started = Instant::now();
        let err = waits
            .until_within(&conditions::visibility_of(&By::css("header")), Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_secs(2));
        match err {
            Error::Timeout {
                operation,
                timeout_ms,
                elapsed_ms,
            } => {
                assert_eq!(operation, "visibility of css:header");
                assert_eq!(timeout_ms, 2000);
                assert!(elapsed_ms >= 2000);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let flaky = Condition::new("flaky", move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            boxed_probe(async move {
                if n < 2 {
                    Err(Error::stale_element(ElementId::new("gone")))
                } else {
                    Ok(Some(n))
                }
            })
        });

        assert_eq!(waits.until(&flaky).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_errors_propagate_immediately() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);

        let dead = Condition::<()>::new("dead session", |_| {
            boxed_probe(async { Err(Error::SessionClosed) })
        });

        let started = Instant::now();
        let err = waits.until(&dead).await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_evaluation_is_cut_at_deadline() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);

        let hanging = Condition::<()>::new("hanging probe", |_| {
            boxed_probe(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Some(()))
            })
        });

        let started = Instant::now();
        let err = waits.until_within(&hanging, Duration::from_secs(1)).await.unwrap_err();
        assert!(err.is_timeout());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1_010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_evaluation_at_deadline() {
        let fake = FakeSession::new(URL);
        let waits = Waits::with_options(
            fake.clone(),
            WaitOptions::new().with_poll_interval(Duration::from_secs(10)),
        );

        let writer = fake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(900)).await;
            writer.with_page(|page| page.add(By::css("footer"), FakeNode::new("footer")));
        });

        // The 10s interval is clamped to the 1s deadline, where one last check runs.
        let found = waits
            .until_within(&conditions::presence_of(&By::css("footer")), Duration::from_secs(1))
            .await;
        assert!(found.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_budget_does_not_overflow() {
        let fake = FakeSession::new(URL);
        fake.with_page(|page| {
            page.add(By::css("header"), FakeNode::new("header"));
        });
        let waits = Waits::with_options(
            fake.clone(),
            WaitOptions::new().with_poll_interval(Duration::MAX),
        );

        let found = waits
            .until_within(&conditions::presence_of(&By::css("header")), Duration::MAX)
            .await;
        assert!(found.is_ok());

        // A huge pause is still clamped to the deadline.
        let started = Instant::now();
        let err = waits
            .until_within(&conditions::presence_of(&By::css("footer")), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2_010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_dispatches_kinds() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);
        fake.with_page(|page| {
            page.add(By::css(".job"), FakeNode::new("div").text("QA Engineer"));
            page.add(By::css(".job"), FakeNode::new("div").text("QA Lead"));
        });
        let budget = Duration::from_secs(1);

        let first = waits.wait_for(ConditionKind::Presence, &By::css(".job"), budget).await.unwrap();
        assert!(first.into_element().is_some());

        let all = waits.wait_for(ConditionKind::AllVisible, &By::css(".job"), budget).await.unwrap();
        assert_eq!(all.into_elements().map(|e| e.len()), Some(2));

        let count = waits
            .wait_for(ConditionKind::CountMoreThan(1), &By::css(".job"), budget)
            .await
            .unwrap();
        assert!(count.is_satisfied());

        let gone = waits
            .wait_for(ConditionKind::Invisibility, &By::css(".spinner"), budget)
            .await
            .unwrap();
        assert!(matches!(gone, WaitOutcome::Satisfied(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_reads_transient_as_not_yet() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);
        let stale = Condition::<()>::new("stale", |_| {
            boxed_probe(async { Err(Error::stale_element(ElementId::new("x"))) })
        });
        assert_eq!(waits.probe(&stale).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_contains_after_navigation() {
        let fake = FakeSession::new(URL);
        let waits = waits_for(&fake);

        let session = fake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            session.goto("https://jobs.lever.co/acme").await.unwrap();
        });

        let url = waits.url_contains("lever").await.unwrap();
        assert_eq!(url, "https://jobs.lever.co/acme");
    }

    fn paused_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// A condition that turns true before the budget is observed no later
        /// than one poll interval after it turned true.
        #[test]
        fn prop_satisfied_within_one_interval(
            appear_ms in 0u64..5_000,
            slack_ms in 1u64..5_000,
            interval_ms in 1u64..1_000,
        ) {
            let budget = Duration::from_millis(appear_ms + slack_ms);
            let interval = Duration::from_millis(interval_ms);

            let (satisfied, elapsed) = paused_runtime().block_on(async move {
                let fake = FakeSession::new(URL);
                let waits = Waits::with_options(
                    fake.clone(),
                    WaitOptions::new().with_poll_interval(interval),
                );
                let writer = fake.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(appear_ms)).await;
                    writer.with_page(|page| page.add(By::css("#ready"), FakeNode::new("div")));
                });

                let started = Instant::now();
                let result = waits
                    .until_within(&conditions::presence_of(&By::css("#ready")), budget)
                    .await;
                (result.is_ok(), started.elapsed())
            });

            prop_assert!(satisfied);
            prop_assert!(elapsed <= budget);
            prop_assert!(elapsed <= Duration::from_millis(appear_ms) + interval);
        }

        /// A condition that never holds always times out, and never early.
        #[test]
        fn prop_never_satisfied_times_out_at_budget(
            budget_ms in 0u64..10_000,
            interval_ms in 0u64..2_000,
        ) {
            let budget = Duration::from_millis(budget_ms);

            let (err, elapsed) = paused_runtime().block_on(async move {
                let fake = FakeSession::new(URL);
                let waits = Waits::with_options(
                    fake,
                    WaitOptions::new().with_poll_interval(Duration::from_millis(interval_ms)),
                );
                let started = Instant::now();
                let err = waits
                    .until_within(&conditions::presence_of(&By::css("#never")), budget)
                    .await
                    .unwrap_err();
                (err, started.elapsed())
            });

            prop_assert!(err.is_timeout());
            prop_assert!(elapsed >= budget);
        }
    }
}
