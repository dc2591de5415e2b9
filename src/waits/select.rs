//! Choosing an entry from a native `<select>` or a custom popup list.

use tracing::debug;

use crate::browser::{By, Element};
use crate::error::{Error, Result};

use super::click::{ClickStrategy, ClickTarget, FALLBACK_CHAIN, RetryBudget};
use super::condition::{Condition, boxed_probe};
use super::{Waits, conditions};

/// Where popup list entries are looked for once a custom dropdown opens.
pub const DEFAULT_POPUP_OPTIONS: &str = "[role='option'], [role='menuitem'], \
     [class*='option'], [class*='menu'] li, [class*='dropdown'] li, \
     [class*='dropdown'] a, [class*='dropdown'] button";

// ============================================================================
// Waits - Select
// ============================================================================

impl Waits {
    /// Selects the entry labelled `text` in the control matched by `by`.
    ///
    /// Custom popups are searched with [`DEFAULT_POPUP_OPTIONS`].
    pub async fn select_option(&self, by: &By, text: &str) -> Result<()> {
        self.select_option_with(by, text, &By::css(DEFAULT_POPUP_OPTIONS))
            .await
    }

    /// Selects the entry labelled `text` in the control matched by `by`.
    ///
    /// A native `<select>` has its matching `<option>` clicked, unless it is
    /// already selected, which makes repeated calls harmless. Any other
    /// control is treated as a custom popup: it is clicked open, then the
    /// first visible match of `popup_options` whose normalized text equals
    /// `text` (or, failing that, contains it) is clicked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionNotFound`] if no entry matches within the
    /// default budget.
    pub async fn select_option_with(&self, by: &By, text: &str, popup_options: &By) -> Result<()> {
        let control = self.present(by).await?;
        let tag = control.tag_name().await?;

        debug!(selector = %by, option = %text, tag = %tag, "Selecting option");

        if tag.eq_ignore_ascii_case("select") {
            self.select_native(by, text).await
        } else {
            self.select_from_popup(by, text, popup_options).await
        }
    }

    async fn select_native(&self, select: &By, text: &str) -> Result<()> {
        let option = self
            .until(&conditions::option_in(select, text))
            .await
            .map_err(|e| option_missing(e, select, text))?;

        let already = match option.is_selected().await {
            Ok(selected) => selected,
            Err(e) if e.is_transient() => false,
            Err(e) => return Err(e),
        };
        if already {
            debug!(selector = %select, option = %text, "Option already selected");
            return Ok(());
        }

        let target = ClickTarget::new(
            format!("option '{text}' in {select}"),
            conditions::option_in(select, text),
            conditions::option_in(select, text),
        );
        self.perform_click(&target, &[ClickStrategy::Direct], RetryBudget::DEFAULT)
            .await?;

        debug!(selector = %select, option = %text, "Option selected");
        Ok(())
    }

    async fn select_from_popup(&self, control: &By, text: &str, options: &By) -> Result<()> {
        self.perform_click(&ClickTarget::located(control), &FALLBACK_CHAIN, RetryBudget::DEFAULT)
            .await?;

        self.until(&conditions::popup_option(options, text))
            .await
            .map_err(|e| option_missing(e, control, text))?;

        let target = ClickTarget::new(
            format!("popup option '{text}' in {control}"),
            clickable_popup_option(options, text),
            conditions::popup_option(options, text),
        );
        let strategy = self
            .perform_click(&target, &FALLBACK_CHAIN, RetryBudget::DEFAULT)
            .await?;

        debug!(selector = %control, option = %text, %strategy, "Popup option selected");
        Ok(())
    }
}

fn option_missing(error: Error, control: &By, text: &str) -> Error {
    if error.is_timeout() {
        Error::option_not_found(control.to_string(), text)
    } else {
        error
    }
}

fn clickable_popup_option(options: &By, text: &str) -> Condition<Element> {
    let visible = conditions::popup_option(options, text);
    Condition::new(format!("clickability of {}", visible.description()), move |session| {
        let probe = visible.evaluate(session);
        boxed_probe(async move {
            let Some(option) = probe.await? else {
                return Ok(None);
            };
            Ok(option.is_enabled().await?.then_some(option))
        })
    })
}

// ============================================================================
// Tests
// ============================================================================
