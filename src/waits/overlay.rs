//! Best-effort dismissal of banners and other overlays.
//!
//! An overlay that is not there is the normal case, not a failure, and an
//! overlay that will not go away must never break the flow behind it. So
//! [`Waits::dismiss_overlay`] has no error path: it reports what happened as a
//! [`Dismissal`] and logs anything unexpected.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::browser::{By, Element};
use crate::error::{Error, Result};

use super::click::{ClickTarget, FALLBACK_CHAIN, RetryBudget};
use super::condition::{Condition, boxed_probe};
use super::{Waits, conditions};

/// Default budget for each overlay probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Overlay
// ============================================================================

/// A dismissible overlay: its container plus the controls that close it.
///
/// Action locators are tried in order. Each is looked up on the whole page
/// first, then inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    container: By,
    actions: Vec<By>,
    probe_timeout: Duration,
}

impl Overlay {
    /// Creates an overlay matched by `container`, with no actions yet.
    #[must_use]
    pub fn new(container: By) -> Self {
        Self {
            container,
            actions: Vec::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Appends a control that dismisses the overlay.
    #[must_use]
    pub fn with_action(mut self, action: By) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the budget of each probe.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Returns the container locator.
    #[inline]
    #[must_use]
    pub fn container(&self) -> &By {
        &self.container
    }

    /// Returns the action locators in the order they are tried.
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &[By] {
        &self.actions
    }

    /// Returns the per-probe budget.
    #[inline]
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

// ============================================================================
// Dismissal
// ============================================================================

/// What [`Waits::dismiss_overlay`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dismissal {
    /// The overlay never showed up. Nothing was clicked.
    Absent,
    /// An action was clicked and the overlay went away.
    Dismissed,
    /// An action was clicked but the overlay stayed visible.
    Lingering,
    /// The overlay could not be dismissed.
    Failed(String),
}

impl Dismissal {
    /// Returns `true` if the overlay is out of the way.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Absent | Self::Dismissed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Page,
    Container,
}

// ============================================================================
// Waits - Overlay
// ============================================================================

impl Waits {
    /// Dismisses `overlay` if it shows up within its probe budget.
    ///
    /// Clicks go through the full [`FALLBACK_CHAIN`]. Never fails.
    pub async fn dismiss_overlay(&self, overlay: &Overlay) -> Dismissal {
        match self.try_dismiss(overlay).await {
            Ok(outcome) => {
                debug!(overlay = %overlay.container, ?outcome, "Overlay handled");
                outcome
            }
            Err(e) => {
                warn!(overlay = %overlay.container, error = %e, "Could not dismiss overlay");
                Dismissal::Failed(e.to_string())
            }
        }
    }

    async fn try_dismiss(&self, overlay: &Overlay) -> Result<Dismissal> {
        let Some(container) = self.overlay_shown(overlay).await? else {
            return Ok(Dismissal::Absent);
        };

        let (index, scope) = self
            .until_within(&action_ready(&container, &overlay.actions), overlay.probe_timeout)
            .await?;
        let action = &overlay.actions[index];
        let target = match scope {
            Scope::Page => ClickTarget::located(action),
            Scope::Container => ClickTarget::within(&container, action),
        };

        self.perform_click(&target, &FALLBACK_CHAIN, RetryBudget::DEFAULT)
            .await?;

        match self
            .until_within(&conditions::invisibility_of_element(&container), overlay.probe_timeout)
            .await
        {
            Ok(_) => Ok(Dismissal::Dismissed),
            Err(e) if e.is_timeout() => Ok(Dismissal::Lingering),
            Err(e) => Err(e),
        }
    }

    /// Returns the container once it is present and visible, or `None` if
    /// either probe runs out.
    async fn overlay_shown(&self, overlay: &Overlay) -> Result<Option<Element>> {
        let present = self
            .until_within(&conditions::presence_of(&overlay.container), overlay.probe_timeout)
            .await;
        let container = match present {
            Ok(container) => container,
            Err(e) if e.is_timeout() => return Ok(None),
            Err(e) => return Err(e),
        };

        match self
            .until_within(&conditions::visibility_of_element(&container), overlay.probe_timeout)
            .await
        {
            Ok(container) => Ok(Some(container)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// The first action with a clickable match, on the page or in the container.
fn action_ready(container: &Element, actions: &[By]) -> Condition<(usize, Scope)> {
    let probes: Arc<Vec<_>> = Arc::new(
        actions
            .iter()
            .map(|by| {
                (
                    conditions::clickability_of(by),
                    conditions::clickability_within(container, by),
                )
            })
            .collect(),
    );

    Condition::new(
        format!("dismiss action for {}", container.id()),
        move |session| {
            let probes = Arc::clone(&probes);
            boxed_probe(async move {
                if probes.is_empty() {
                    return Err(Error::invalid_argument("overlay has no dismiss actions"));
                }
                for (index, (page, scoped)) in probes.iter().enumerate() {
                    if page.evaluate(Arc::clone(&session)).await?.is_some() {
                        return Ok(Some((index, Scope::Page)));
                    }
                    if scoped.evaluate(Arc::clone(&session)).await?.is_some() {
                        return Ok(Some((index, Scope::Container)));
                    }
                }
                Ok(None)
            })
        },
    )
}

// ============================================================================
// Tests
// ============================================================================
