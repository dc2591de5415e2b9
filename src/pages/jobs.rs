//! Open positions listing.
//!
//! The listing is rendered client side. Filters are filled in after the page
//! loads, and the cards are replaced whenever a filter changes, so every step
//! here waits for the state it needs instead of assuming it.
//!
//! # Example
//!
//! ```ignore
//! let jobs = JobsListingPage::new(waits, Duration::from_secs(60));
//! jobs.wait_for_department_filter_ready().await?;
//! jobs.apply_location_filter("Istanbul, Turkiye").await?;
//! jobs.apply_department_filter("Quality Assurance").await?;
//! jobs.wait_for_list_refresh().await?;
//!
//! for card in jobs.job_cards().await? {
//!     println!("{} ({})", card.title().await?, card.location().await?);
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;

use crate::browser::{By, Element};
use crate::error::Result;
use crate::waits::{ClickTarget, Dismissal, Waits, conditions};

use super::consent;

// ============================================================================
// Locators
// ============================================================================

/// Native location `<select>`.
pub const LOCATION_SELECT: &str = "//select[@id='filter-by-location']";

/// Department filter: a native select, or whatever follows its label.
pub const DEPARTMENT_FILTER: &str = "//select[@id='filter-by-department' or @name='filter-by-department'] | \
    //label[normalize-space()='Department']/following::select[1]";

/// Container of the job list.
pub const JOB_LIST: &str = "//div[contains(@class,'positions') or contains(@class,'jobs-list') or \
    contains(@class,'position-list') or contains(@class,'careers') or contains(@class,'jobs')]";

/// One job card.
pub const JOB_CARDS: &str = "//div[contains(@class,'position') or contains(@class,'job') or \
    contains(@class,'list-item') or contains(@class,'role')]";

/// Loaders and overlays shown while the listing initializes.
pub const PAGE_LOADERS: &str = "[class*='loading'], [class*='spinner'], [class*='overlay']";

/// Title inside a card.
pub const CARD_TITLE: &str = "*[class*='title'], h2, h3, h4";

/// Any heading inside a card.
pub const CARD_HEADING: &str = "h1, h2, h3, h4, h5, h6";

/// Department inside a card.
pub const CARD_DEPARTMENT: &str = "*[class*='department'], *[class*='dept']";

/// Location inside a card.
pub const CARD_LOCATION: &str = "*[class*='location'], *[class*='loc']";

/// "View Role" control inside a card.
pub const CARD_VIEW_ROLE: &str = ".//a[contains(@class,'btn') and (normalize-space()='View Role' or contains(.,'View Role'))] | \
    .//a[normalize-space()='View Role' or contains(.,'View Role')] | \
    .//button[normalize-space()='View Role' or contains(.,'View Role')]";

/// Cards with this much text or less are still skeletons.
const RENDERED_TEXT_MIN: usize = 10;

const VIEW_ROLE_LABEL: &str = "View Role";

// ============================================================================
// JobsListingPage
// ============================================================================

/// The open positions page.
#[derive(Debug, Clone)]
pub struct JobsListingPage {
    waits: Waits,
    /// Waits for the slow parts of the listing: filters and cards.
    slow: Waits,
}

impl JobsListingPage {
    /// Creates the facade. `list_timeout` bounds the waits on the location
    /// filter and on the job cards.
    pub fn new(waits: Waits, list_timeout: Duration) -> Self {
        let slow = waits.with_timeout(list_timeout);
        Self { waits, slow }
    }

    /// Dismisses the cookie banner if it shows up.
    pub async fn accept_cookies_if_present(&self) -> Dismissal {
        self.waits.dismiss_overlay(&consent::cookie_banner()).await
    }

    /// Waits until the department filter is visible.
    pub async fn wait_for_department_filter_ready(&self) -> Result<()> {
        self.waits.visible(&By::xpath(DEPARTMENT_FILTER)).await?;
        Ok(())
    }

    /// Selects `location` in the location filter.
    ///
    /// Waits for the document to finish loading, for loaders to go away and
    /// for the select to become clickable, then for the option to be loaded.
    pub async fn apply_location_filter(&self, location: &str) -> Result<()> {
        let select = By::xpath(LOCATION_SELECT);

        self.waits.document_ready().await?;
        self.waits.invisible(&By::css(PAGE_LOADERS)).await?;

        let control = self.slow.clickable(&select).await?;
        control.scroll_into_view().await?;

        self.slow.select_option(&select, location).await?;
        debug!(%location, "Location filter applied");
        Ok(())
    }

    /// Selects `department` in the department filter.
    pub async fn apply_department_filter(&self, department: &str) -> Result<()> {
        self.waits
            .select_option(&By::xpath(DEPARTMENT_FILTER), department)
            .await?;
        debug!(%department, "Department filter applied");
        Ok(())
    }

    /// Waits until the list is visible and its cards are rendered.
    pub async fn wait_for_list_refresh(&self) -> Result<()> {
        let cards = By::xpath(JOB_CARDS);

        self.waits.visible(&By::xpath(JOB_LIST)).await?;
        self.slow.count_more_than(&cards, 0).await?;
        let rendered = self
            .slow
            .until(&conditions::visible_text_longer_than(&cards, RENDERED_TEXT_MIN))
            .await?;

        debug!(cards = rendered.len(), "Job list refreshed");
        Ok(())
    }

    /// Returns the displayed job cards, in document order.
    pub async fn job_cards(&self) -> Result<Vec<JobCard>> {
        let by = By::xpath(JOB_CARDS);
        self.waits.count_more_than(&by, 0).await?;

        let mut cards = Vec::new();
        for id in self.waits.session().find_elements(&by).await? {
            let container = self.waits.element(id);
            match container.is_displayed().await {
                Ok(true) => cards.push(JobCard::new(container)),
                Ok(false) => {}
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(cards)
    }
}

// ============================================================================
// JobCard
// ============================================================================

/// One position in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    container: Element,
}

impl JobCard {
    /// Wraps a card container.
    pub fn new(container: Element) -> Self {
        Self { container }
    }

    /// Returns the card container.
    #[must_use]
    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Returns the position title.
    ///
    /// Tries the title element, then the first heading, then the first line
    /// of the card text that is not the "View Role" label. Empty if none.
    pub async fn title(&self) -> Result<String> {
        for locator in [CARD_TITLE, CARD_HEADING] {
            if let Some(text) = self.first_text(&By::css(locator)).await?
                && !text.is_empty()
            {
                return Ok(text);
            }
        }

        let full = self.container.text().await?;
        Ok(full
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.eq_ignore_ascii_case(VIEW_ROLE_LABEL))
            .unwrap_or_default()
            .to_string())
    }

    /// Returns the department, or the whole card text if it has no
    /// department element.
    pub async fn department(&self) -> Result<String> {
        self.labelled(CARD_DEPARTMENT).await
    }

    /// Returns the location, or the whole card text if it has no location
    /// element.
    pub async fn location(&self) -> Result<String> {
        self.labelled(CARD_LOCATION).await
    }

    /// Returns the rendered text of the whole card.
    pub async fn full_text(&self) -> Result<String> {
        self.container.text().await
    }

    /// Returns the card's "View Role" control.
    pub async fn view_role(&self) -> Result<Element> {
        self.container.find_element(&By::xpath(CARD_VIEW_ROLE)).await
    }

    /// Click target for the card's "View Role" control.
    ///
    /// The control is resolved inside this card on every attempt and clicked
    /// where it is, without scrolling the listing.
    #[must_use]
    pub fn view_role_target(&self) -> ClickTarget {
        ClickTarget::within(&self.container, &By::xpath(CARD_VIEW_ROLE)).without_scroll()
    }

    async fn labelled(&self, css: &str) -> Result<String> {
        match self.first_text(&By::css(css)).await? {
            Some(text) => Ok(text),
            None => self.container.text().await,
        }
    }

    async fn first_text(&self, by: &By) -> Result<Option<String>> {
        let Some(element) = self.container.find_elements(by).await?.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(element.text().await?.trim().to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
