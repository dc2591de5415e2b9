//! QA careers page.

use tracing::debug;
use url::Url;

use crate::browser::By;
use crate::error::Result;
use crate::waits::Waits;

/// The "See all QA jobs" link or button.
pub const SEE_ALL_QA_JOBS: &str =
    "//a[normalize-space()='See all QA jobs'] | //button[normalize-space()='See all QA jobs']";

/// Loading indicators that swallow clicks while shown.
pub const LOADERS: &str = "[class*='loading'], [class*='spinner']";

/// Path of the page relative to the site root.
pub const PATH: &str = "careers/quality-assurance/";

/// The QA careers page.
#[derive(Debug, Clone)]
pub struct CareersQaPage {
    waits: Waits,
    url: Url,
}

impl CareersQaPage {
    /// Creates the facade for the page at `url`.
    pub fn new(waits: Waits, url: Url) -> Self {
        Self { waits, url }
    }

    /// Returns the page URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Navigates to the page.
    pub async fn open(&self) -> Result<()> {
        debug!(url = %self.url, "Opening QA careers page");
        self.waits.session().goto(self.url.as_str()).await
    }

    /// Waits for the "See all QA jobs" control and reports whether it is displayed.
    pub async fn is_see_all_jobs_visible(&self) -> Result<bool> {
        let element = self.waits.visible(&By::xpath(SEE_ALL_QA_JOBS)).await?;
        element.is_displayed().await
    }

    /// Waits out loaders, then clicks "See all QA jobs" with up to three attempts.
    pub async fn click_see_all_jobs(&self) -> Result<()> {
        self.waits.invisible(&By::css(LOADERS)).await?;
        self.waits
            .click_with_retry(&By::xpath(SEE_ALL_QA_JOBS), 3)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::{FakeNode, FakeSession};
    use crate::waits::ClickStrategy;

    #[tokio::test(start_paused = true)]
    async fn test_click_waits_for_loader_and_retries() {
        let fake = FakeSession::new("https://example.test/careers/quality-assurance/");
        let loader = fake.with_page(|page| {
            page.add(
                By::xpath(SEE_ALL_QA_JOBS),
                FakeNode::new("a")
                    .text("See all QA jobs")
                    .fail_clicks(ClickStrategy::Direct, 2),
            );
            page.add(By::css(LOADERS), FakeNode::new("div"))
        });
        let waits = Waits::new(fake.clone());
        let careers = CareersQaPage::new(
            waits,
            Url::parse("https://example.test/careers/quality-assurance/").unwrap(),
        );

        let remover = fake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            remover.with_page(|page| page.remove(&loader));
        });

        assert!(careers.is_see_all_jobs_visible().await.unwrap());
        careers.click_see_all_jobs().await.unwrap();
        assert_eq!(fake.stats().native_clicks, 3);
    }
}
