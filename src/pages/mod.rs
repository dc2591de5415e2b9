//! Page facades for the recruiting site.
//!
//! Each facade owns its locators and talks to the browser only through
//! [`Waits`](crate::waits::Waits). Locator sources are public so a fake site
//! can register nodes under the exact same [`By`](crate::browser::By) values.
//!
//! | Page | Description |
//! |------|-------------|
//! | [`HomePage`] | Landing page: header, hero, footer |
//! | [`CareersQaPage`] | QA careers page with the "See all QA jobs" link |
//! | [`JobsListingPage`] | Open positions with location and department filters |
//! | [`JobCard`] | One position in the listing |

// ============================================================================
// Submodules
// ============================================================================

/// QA careers page.
pub mod careers;

/// Cookie consent banner shared by every page.
pub mod consent;

/// Landing page.
pub mod home;

/// Open positions listing.
pub mod jobs;

// ============================================================================
// Re-exports
// ============================================================================

pub use careers::CareersQaPage;
pub use home::HomePage;
pub use jobs::{JobCard, JobsListingPage};
