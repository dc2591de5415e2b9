//! The condition value polled by [`Waits`](super::Waits).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::browser::Session;
use crate::error::Result;

/// Future returned by one evaluation of a [`Condition`].
///
/// `Ok(Some(value))` satisfies the condition, `Ok(None)` means "not yet".
pub type ProbeFuture<T> = BoxFuture<'static, Result<Option<T>>>;

type ProbeFn<T> = dyn Fn(Arc<dyn Session>) -> ProbeFuture<T> + Send + Sync;

/// A described, re-evaluable check against the live session.
///
/// Conditions hold no state between evaluations: each call resolves its
/// locators afresh, which is what makes them tolerate re-renders.
///
/// # Example
///
/// ```ignore
/// let ready = Condition::new("document ready", |session| {
///     boxed_probe(async move {
///         let state = session.execute_script("return document.readyState", vec![]).await?;
///         Ok((state == "complete").then_some(()))
///     })
/// });
/// ```
pub struct Condition<T> {
    description: String,
    probe: Box<ProbeFn<T>>,
}

impl<T> fmt::Debug for Condition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Condition<T> {
    /// Creates a condition from a description and a probe.
    pub fn new<F>(description: impl Into<String>, probe: F) -> Self
    where
        F: Fn(Arc<dyn Session>) -> ProbeFuture<T> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            probe: Box::new(probe),
        }
    }

    /// Returns the description used in logs and timeout errors.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Runs the probe once.
    pub fn evaluate(&self, session: Arc<dyn Session>) -> ProbeFuture<T> {
        (self.probe)(session)
    }

    /// Transforms the satisfying value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Condition<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let Self { description, probe } = self;
        Condition::new(description, move |session| {
            let inner = probe(session);
            let f = Arc::clone(&f);
            boxed_probe(async move { Ok(inner.await?.map(|value| f(value))) })
        })
    }
}

/// Boxes a probe body into a [`ProbeFuture`].
#[inline]
pub fn boxed_probe<T, F>(future: F) -> ProbeFuture<T>
where
    F: Future<Output = Result<Option<T>>> + Send + 'static,
{
    Box::pin(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeSession;

    #[tokio::test]
    async fn test_map_transforms_value() {
        let fake = FakeSession::new("https://example.test/careers");
        let url = Condition::new("current url", |session: Arc<dyn Session>| {
            boxed_probe(async move { Ok(Some(session.current_url().await?)) })
        });
        let length = url.map(|url| url.len());

        assert_eq!(length.description(), "current url");
        assert_eq!(length.evaluate(fake).await.unwrap(), Some(28));
    }
}
