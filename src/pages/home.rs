//! Landing page.

use tracing::debug;
use url::Url;

use crate::browser::By;
use crate::error::Result;
use crate::waits::{Dismissal, Waits};

use super::consent;

/// Site header.
pub const HEADER: &str = "header";

/// Site footer.
pub const FOOTER: &str = "footer";

/// Hero heading, wherever the theme puts it.
pub const HERO_HEADING: &str = "main h1, .hero h1, h1";

// ============================================================================
// HomePage
// ============================================================================

/// The site's landing page.
#[derive(Debug, Clone)]
pub struct HomePage {
    waits: Waits,
    url: Url,
}

impl HomePage {
    /// Creates the facade for the landing page at `url`.
    pub fn new(waits: Waits, url: Url) -> Self {
        Self { waits, url }
    }

    /// Returns the page URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Navigates to the landing page.
    pub async fn open(&self) -> Result<()> {
        debug!(url = %self.url, "Opening home page");
        self.waits.session().goto(self.url.as_str()).await
    }

    /// Dismisses the cookie banner if it shows up.
    pub async fn accept_cookies_if_present(&self) -> Dismissal {
        self.waits.dismiss_overlay(&consent::cookie_banner()).await
    }

    /// Waits for the header and reports whether it is displayed.
    pub async fn is_header_visible(&self) -> Result<bool> {
        self.is_visible(HEADER).await
    }

    /// Waits for the hero heading and reports whether it is displayed.
    pub async fn is_hero_visible(&self) -> Result<bool> {
        self.is_visible(HERO_HEADING).await
    }

    /// Waits for the footer and reports whether it is displayed.
    pub async fn is_footer_visible(&self) -> Result<bool> {
        self.is_visible(FOOTER).await
    }

    async fn is_visible(&self, css: &str) -> Result<bool> {
        let element = self.waits.visible(&By::css(css)).await?;
        element.is_displayed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::Error;
    use crate::mock::{FakeNode, FakeSession};

    const URL: &str = "https://example.test/";

    #[tokio::test(start_paused = true)]
    async fn test_home_page_sections() {
        let fake = FakeSession::new("about:blank");
        fake.route(URL, |page| {
            page.add(By::css(HEADER), FakeNode::new("header"));
            page.add(By::css(HERO_HEADING), FakeNode::new("h1").text("Welcome"));
        });
        let waits = Waits::new(fake.clone()).with_timeout(Duration::from_secs(2));
        let home = HomePage::new(waits, Url::parse(URL).unwrap());

        home.open().await.unwrap();
        assert!(home.is_header_visible().await.unwrap());
        assert!(home.is_hero_visible().await.unwrap());

        let err = home.is_footer_visible().await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
