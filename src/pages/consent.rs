//! Cookie consent banner.
//!
//! The banner markup differs between pages and deployments, so the container
//! and the accept control are matched by several alternatives. The accept
//! locators are tried in order: the consent plugin's own button, any "Accept
//! All" control on the page, then an accept control inside the banner.

use std::time::Duration;

use crate::browser::By;
use crate::waits::Overlay;

/// Any element that looks like a cookie or consent banner.
pub const BANNER: &str = "//div[contains(@class, 'cli-bar-container')] | \
    //div[contains(@class, 'cookie') or contains(@class, 'consent') or contains(@id, 'cookie') or contains(@id, 'consent')] | \
    //div[@role='dialog' and (contains(., 'cookie') or contains(., 'Cookie'))] | \
    //*[contains(@class, 'cookie-banner') or contains(@class, 'cookie-consent') or contains(@id, 'cookie-banner')]";

/// The consent plugin's "accept all" button.
pub const ACCEPT_BY_ID: &str =
    "//a[@id='wt-cli-accept-all-btn'] | //button[@id='wt-cli-accept-all-btn']";

/// Any "Accept All" control on the page.
pub const ACCEPT_ALL: &str = "//a[@id='wt-cli-accept-all-btn'] | \
    //button[@id='wt-cli-accept-all-btn'] | \
    //button[normalize-space()='Accept All' or contains(., 'Accept All')] | \
    //a[normalize-space()='Accept All' or contains(., 'Accept All')] | \
    //button[contains(@class, 'accept') and (contains(., 'All') or contains(., 'all'))] | \
    //button[contains(text(), 'Accept')] | \
    //a[contains(text(), 'Accept')]";

/// An accept control inside the banner.
pub const ACCEPT_IN_BANNER: &str = ".//a[@id='wt-cli-accept-all-btn'] | \
    .//button[@id='wt-cli-accept-all-btn'] | \
    .//button[contains(text(), 'Accept')] | \
    .//a[contains(text(), 'Accept')]";

/// Banners are often injected late, so each probe gets a generous budget.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// The cookie banner as a dismissible overlay.
#[must_use]
pub fn cookie_banner() -> Overlay {
    Overlay::new(By::xpath(BANNER))
        .with_action(By::xpath(ACCEPT_BY_ID))
        .with_action(By::xpath(ACCEPT_ALL))
        .with_action(By::xpath(ACCEPT_IN_BANNER))
        .with_probe_timeout(PROBE_TIMEOUT)
}
