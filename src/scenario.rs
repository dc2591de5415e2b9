//! The QA jobs end-to-end scenario.
//!
//! [`QaJobsFlow`] walks a visitor from the landing page to a QA position's
//! application form:
//!
//! 1. Home page: banner dismissed, header, hero and footer visible
//! 2. QA careers page: "See all QA jobs" visible
//! 3. "See all QA jobs" clicked
//! 4. Listing filtered by location, then by department
//! 5. Job list refreshed and non-empty
//! 6. "View Role" clicked on the first card
//! 7. Application form reached, in a new window or the same one
//!
//! A failed check surfaces as [`Error::Assertion`] naming the step and what
//! was observed. Engine failures (a dead session, a script error) surface as
//! themselves.
//!
//! # Example
//!
//! ```ignore
//! let config = ScenarioConfig::from_env()?;
//! let session = WebDriverSession::connect(config.webdriver_url()).await?;
//! let report = QaJobsFlow::new(session, config).run().await?;
//! println!("{} jobs, first: {}", report.job_count, report.first_job_title);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::browser::Session;
use crate::error::{Error, Result};
use crate::pages::{CareersQaPage, HomePage, JobsListingPage, careers};
use crate::waits::{ClickStrategy, RetryBudget, WaitOptions, Waits};

// ============================================================================
// Constants
// ============================================================================

/// Default site root.
pub const DEFAULT_BASE_URL: &str = "https://example.test/";

/// Default budget of every ordinary wait.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(15);

/// Default budget of the slow listing waits.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest accepted wait budget.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Default location filter value.
pub const DEFAULT_LOCATION: &str = "Istanbul, Turkiye";

/// Default department filter value.
pub const DEFAULT_DEPARTMENT: &str = "Quality Assurance";

/// Default fragment the application form URL must contain.
pub const DEFAULT_APPLICATION_FRAGMENT: &str = "lever";

/// Default WebDriver endpoint.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Environment variable overriding the site root.
pub const ENV_BASE_URL: &str = "E2E_BASE_URL";

/// Environment variable overriding the step timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "E2E_TIMEOUT_SECS";

/// Environment variable overriding the listing timeout, in seconds.
pub const ENV_LIST_TIMEOUT_SECS: &str = "E2E_LIST_TIMEOUT_SECS";

/// Environment variable overriding the WebDriver endpoint.
pub const ENV_WEBDRIVER_URL: &str = "WEBDRIVER_URL";

// ============================================================================
// ScenarioConfig
// ============================================================================

/// Validated scenario settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    base_url: Url,
    step_timeout: Duration,
    list_timeout: Duration,
    location: String,
    department: String,
    application_fragment: String,
    webdriver_url: String,
}

impl ScenarioConfig {
    /// Creates a builder starting from the defaults.
    #[inline]
    #[must_use]
    pub fn builder() -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::new()
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(url) = lookup(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            builder = builder.step_timeout(parse_secs(ENV_TIMEOUT_SECS, &secs)?);
        }
        if let Some(secs) = lookup(ENV_LIST_TIMEOUT_SECS) {
            builder = builder.list_timeout(parse_secs(ENV_LIST_TIMEOUT_SECS, &secs)?);
        }
        if let Some(url) = lookup(ENV_WEBDRIVER_URL) {
            builder = builder.webdriver_url(url);
        }
        builder.build()
    }

    /// Returns the site root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the QA careers page URL.
    pub fn careers_qa_url(&self) -> Result<Url> {
        Ok(self.base_url.join(careers::PATH)?)
    }

    /// Returns the budget of every ordinary wait.
    #[must_use]
    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    /// Returns the budget of the slow listing waits.
    #[must_use]
    pub fn list_timeout(&self) -> Duration {
        self.list_timeout
    }

    /// Returns the location filter value.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the department filter value.
    #[must_use]
    pub fn department(&self) -> &str {
        &self.department
    }

    /// Returns the fragment the application form URL must contain.
    #[must_use]
    pub fn application_fragment(&self) -> &str {
        &self.application_fragment
    }

    /// Returns the WebDriver endpoint.
    #[must_use]
    pub fn webdriver_url(&self) -> &str {
        &self.webdriver_url
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::config(format!("{key} must be a whole number of seconds, got '{value}'")))
}

// ============================================================================
// ScenarioConfigBuilder
// ============================================================================

/// Builder for [`ScenarioConfig`].
#[derive(Debug, Default, Clone)]
pub struct ScenarioConfigBuilder {
    base_url: Option<String>,
    step_timeout: Option<Duration>,
    list_timeout: Option<Duration>,
    location: Option<String>,
    department: Option<String>,
    application_fragment: Option<String>,
    webdriver_url: Option<String>,
}

impl ScenarioConfigBuilder {
    /// Creates a builder with no overrides.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the site root. A missing trailing slash is added.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the budget of every ordinary wait.
    #[must_use]
    pub fn step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Sets the budget of the slow listing waits.
    #[must_use]
    pub fn list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = Some(timeout);
        self
    }

    /// Sets the location filter value.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the department filter value.
    #[must_use]
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Sets the fragment the application form URL must contain.
    #[must_use]
    pub fn application_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.application_fragment = Some(fragment.into());
        self
    }

    /// Sets the WebDriver endpoint.
    #[must_use]
    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the base URL is not http(s), a timeout is zero
    ///   or longer than [`MAX_TIMEOUT`], or a filter value is blank
    /// - [`Error::Url`] if the base URL does not parse
    pub fn build(self) -> Result<ScenarioConfig> {
        let base_url =
            Self::validate_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let step_timeout = Self::validate_timeout("step timeout", self.step_timeout)?
            .unwrap_or(DEFAULT_STEP_TIMEOUT);
        let list_timeout = Self::validate_timeout("list timeout", self.list_timeout)?
            .unwrap_or(DEFAULT_LIST_TIMEOUT);

        Ok(ScenarioConfig {
            base_url,
            step_timeout,
            list_timeout,
            location: Self::validate_text("location", self.location)?
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            department: Self::validate_text("department", self.department)?
                .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
            application_fragment: Self::validate_text("application fragment", self.application_fragment)?
                .unwrap_or_else(|| DEFAULT_APPLICATION_FRAGMENT.to_string()),
            webdriver_url: self
                .webdriver_url
                .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ScenarioConfigBuilder {
    fn validate_base_url(raw: &str) -> Result<Url> {
        let mut url = Url::parse(raw.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base URL must be http or https, got '{raw}'"
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    fn validate_timeout(name: &str, timeout: Option<Duration>) -> Result<Option<Duration>> {
        match timeout {
            Some(t) if t.is_zero() => Err(Error::config(format!("{name} must be greater than zero"))),
            Some(t) if t > MAX_TIMEOUT => Err(Error::config(format!(
                "{name} must be at most {}s, got {}s",
                MAX_TIMEOUT.as_secs(),
                t.as_secs()
            ))),
            other => Ok(other),
        }
    }

    fn validate_text(name: &str, value: Option<String>) -> Result<Option<String>> {
        match value {
            Some(v) if v.trim().is_empty() => Err(Error::config(format!("{name} must not be blank"))),
            other => Ok(other),
        }
    }
}

// ============================================================================
// FlowReport
// ============================================================================

/// What a successful run observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReport {
    /// Displayed job cards after filtering.
    pub job_count: usize,
    /// Title of the first card.
    pub first_job_title: String,
    /// URL of the application form.
    pub final_url: String,
    /// Whether "View Role" opened a new window.
    pub opened_new_window: bool,
}

// ============================================================================
// QaJobsFlow
// ============================================================================

/// The QA jobs scenario over one session.
pub struct QaJobsFlow {
    session: Arc<dyn Session>,
    config: ScenarioConfig,
}

impl std::fmt::Debug for QaJobsFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaJobsFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QaJobsFlow {
    /// Creates the scenario.
    pub fn new(session: Arc<dyn Session>, config: ScenarioConfig) -> Self {
        Self { session, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Runs every step in order, stopping at the first failure.
    pub async fn run(&self) -> Result<FlowReport> {
        let waits = Waits::with_options(
            Arc::clone(&self.session),
            WaitOptions::new().with_timeout(self.config.step_timeout),
        );
        let original = self.session.current_window().await?;

        // Home page
        info!(url = %self.config.base_url, "Step 1: home page");
        let home = HomePage::new(waits.clone(), self.config.base_url.clone());
        home.open().await?;
        let banner = home.accept_cookies_if_present().await;
        debug!(?banner, "Home page banner");
        check("home page header", home.is_header_visible().await)?;
        check("home page hero", home.is_hero_visible().await)?;
        check("home page footer", home.is_footer_visible().await)?;

        // QA careers page
        info!("Step 2: QA careers page");
        let careers = CareersQaPage::new(waits.clone(), self.config.careers_qa_url()?);
        careers.open().await?;
        check("see all QA jobs", careers.is_see_all_jobs_visible().await)?;

        info!("Step 3: see all QA jobs");
        careers.click_see_all_jobs().await?;

        // Filters
        info!(location = %self.config.location, department = %self.config.department, "Step 4: filters");
        let jobs = JobsListingPage::new(waits.clone(), self.config.list_timeout);
        let banner = jobs.accept_cookies_if_present().await;
        debug!(?banner, "Listing banner");
        jobs.wait_for_department_filter_ready().await?;
        jobs.apply_location_filter(&self.config.location).await?;
        jobs.apply_department_filter(&self.config.department).await?;

        // Job list
        info!("Step 5: job list");
        jobs.wait_for_list_refresh().await?;
        let cards = jobs.job_cards().await?;
        let Some(first) = cards.first() else {
            return Err(Error::assertion(
                "job list",
                "job list should not be empty after applying filters, found 0 cards",
            ));
        };
        let first_job_title = first.title().await?;
        debug!(cards = cards.len(), first = %first_job_title, "Job list displayed");

        // View Role: direct, then script, one round
        info!(job = %first_job_title, "Step 6: view role");
        waits
            .perform_click(
                &first.view_role_target(),
                &[ClickStrategy::Direct, ClickStrategy::Scripted],
                RetryBudget::ONCE,
            )
            .await?;

        // Application form
        info!("Step 7: application form");
        let opened = waits.follow_new_window(&original).await?;
        let fragment = &self.config.application_fragment;
        let final_url = match waits.url_contains(fragment).await {
            Ok(url) => url,
            Err(e) if e.is_timeout() => {
                let current = self.session.current_url().await?;
                return Err(Error::assertion(
                    "application redirect",
                    format!("URL should contain '{fragment}' after clicking View Role. Current URL: {current}"),
                ));
            }
            Err(e) => return Err(e),
        };
        waits.document_ready().await?;

        let report = FlowReport {
            job_count: cards.len(),
            first_job_title,
            final_url,
            opened_new_window: opened.is_some(),
        };
        info!(?report, "QA jobs flow passed");
        Ok(report)
    }
}

/// Turns a visibility check into a step assertion.
fn check(step: &str, visible: Result<bool>) -> Result<()> {
    match visible {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::assertion(step, "element found but not displayed")),
        Err(e) if e.is_timeout() => Err(Error::assertion(step, e.to_string())),
        Err(e) => Err(e),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: FxHashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScenarioConfig::builder().build().unwrap();
        assert_eq!(config, ScenarioConfig::from_lookup(|_| None).unwrap());
        assert_eq!(config.base_url().as_str(), "https://example.test/");
        assert_eq!(config.step_timeout(), Duration::from_secs(15));
        assert_eq!(config.list_timeout(), Duration::from_secs(60));
        assert_eq!(config.location(), "Istanbul, Turkiye");
        assert_eq!(config.department(), "Quality Assurance");
        assert_eq!(config.application_fragment(), "lever");
        assert_eq!(
            config.careers_qa_url().unwrap().as_str(),
            "https://example.test/careers/quality-assurance/"
        );
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ScenarioConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:8080/site"),
            (ENV_TIMEOUT_SECS, " 5 "),
            (ENV_LIST_TIMEOUT_SECS, "90"),
            (ENV_WEBDRIVER_URL, "http://grid:4444"),
        ]))
        .unwrap();

        assert_eq!(config.base_url().as_str(), "http://localhost:8080/site/");
        assert_eq!(
            config.careers_qa_url().unwrap().as_str(),
            "http://localhost:8080/site/careers/quality-assurance/"
        );
        assert_eq!(config.step_timeout(), Duration::from_secs(5));
        assert_eq!(config.list_timeout(), Duration::from_secs(90));
        assert_eq!(config.webdriver_url(), "http://grid:4444");
    }

    #[test]
    fn test_invalid_values() {
        let err = ScenarioConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ScenarioConfig::builder().base_url("ftp://example.test/").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ScenarioConfig::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Url(_)));

        let err = ScenarioConfig::builder()
            .step_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ScenarioConfig::builder().department("  ").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_oversized_timeouts_are_rejected() {
        let max = u64::MAX.to_string();
        let err = ScenarioConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, max.as_str())])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = ScenarioConfig::builder()
            .list_timeout(Duration::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let config = ScenarioConfig::builder().step_timeout(MAX_TIMEOUT).build().unwrap();
        assert_eq!(config.step_timeout(), MAX_TIMEOUT);
    }

    #[test]
    fn test_check() {
        assert!(check("header", Ok(true)).is_ok());
        assert!(matches!(
            check("header", Ok(false)),
            Err(Error::Assertion { .. })
        ));
        let timeout = Error::timeout("visibility of css:header", Duration::from_secs(1), Duration::from_secs(1));
        match check("home page header", Err(timeout)) {
            Err(Error::Assertion { step, .. }) => assert_eq!(step, "home page header"),
            other => panic!("expected Assertion, got {other:?}"),
        }
        assert!(matches!(
            check("header", Err(Error::SessionClosed)),
            Err(Error::SessionClosed)
        ));
    }
}
