//! Element locator strategies.
//!
//! A [`By`] is an immutable description of how to find nodes. It carries no
//! lifecycle: facades keep them as configuration and every poll re-resolves
//! them against the live session.
//!
//! # Example
//!
//! ```ignore
//! use careers_e2e::By;
//!
//! let header = By::css("header");
//! let see_all = By::xpath("//a[normalize-space()='See all QA jobs']");
//! let location = By::id("filter-by-location");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::script::json_string;

// ============================================================================
// By Enum
// ============================================================================

/// Element locator strategy (like Selenium's `By`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value")]
pub enum By {
    /// CSS selector (most common).
    ///
    /// # Example
    /// ```ignore
    /// By::Css("main h1, .hero h1, h1")
    /// By::Css("[class*='loading'], [class*='spinner']")
    /// ```
    #[serde(rename = "css")]
    Css(String),

    /// XPath expression.
    ///
    /// # Example
    /// ```ignore
    /// By::XPath("//select[@id='filter-by-location']")
    /// ```
    #[serde(rename = "xpath")]
    XPath(String),

    /// Element ID (shorthand for `#id` CSS selector).
    #[serde(rename = "id")]
    Id(String),

    /// Tag name.
    #[serde(rename = "tag")]
    Tag(String),

    /// Name attribute.
    #[serde(rename = "name")]
    Name(String),

    /// Class name (single class).
    #[serde(rename = "class")]
    Class(String),

    /// Link text (for `<a>` elements).
    #[serde(rename = "linkText")]
    LinkText(String),
}

impl By {
    /// Creates a CSS selector.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an XPath selector.
    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Creates an ID selector.
    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates a tag name selector.
    #[inline]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Creates a name attribute selector.
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a class name selector.
    #[inline]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Creates a link text selector.
    #[inline]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Returns the strategy name.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Id(_) => "id",
            Self::Tag(_) => "tag",
            Self::Name(_) => "name",
            Self::Class(_) => "class",
            Self::LinkText(_) => "linkText",
        }
    }

    /// Returns the selector value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v)
            | Self::XPath(v)
            | Self::Id(v)
            | Self::Tag(v)
            | Self::Name(v)
            | Self::Class(v)
            | Self::LinkText(v) => v,
        }
    }

    /// Lowers this locator to one of the W3C WebDriver strategies.
    ///
    /// # Returns
    ///
    /// Tuple of (W3C strategy name, selector).
    #[must_use]
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self {
            Self::Css(v) => ("css selector", v.clone()),
            Self::XPath(v) => ("xpath", v.clone()),
            Self::Id(v) => ("css selector", format!("[id={}]", json_string(v))),
            Self::Tag(v) => ("css selector", v.clone()),
            Self::Name(v) => ("css selector", format!("[name={}]", json_string(v))),
            Self::Class(v) => ("css selector", format!("[class~={}]", json_string(v))),
            Self::LinkText(v) => ("link text", v.clone()),
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.value())
    }
}

// ============================================================================
// From implementations for ergonomics
// ============================================================================

impl From<&str> for By {
    /// Converts a string to CSS selector (default).
    fn from(s: &str) -> Self {
        Self::Css(s.to_string())
    }
}

impl From<String> for By {
    /// Converts a string to CSS selector (default).
    fn from(s: String) -> Self {
        Self::Css(s)
    }
}

// ============================================================================
// Quoting Helpers
// ============================================================================

/// Quotes `text` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so text holding both quote kinds is split
/// into pieces joined with `concat()`.
///
/// # Example
///
/// ```ignore
/// assert_eq!(xpath_literal("Istanbul, Turkiye"), "'Istanbul, Turkiye'");
/// assert_eq!(xpath_literal("it's"), "\"it's\"");
/// ```
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }

    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_css() {
        let by = By::Css("#login".to_string());
        assert_eq!(by.strategy(), "css");
        assert_eq!(by.value(), "#login");
    }

    #[test]
    fn test_by_xpath() {
        let by = By::XPath("//button".to_string());
        assert_eq!(by.strategy(), "xpath");
        assert_eq!(by.value(), "//button");
    }

    #[test]
    fn test_display() {
        assert_eq!(By::css("footer").to_string(), "css:footer");
        assert_eq!(By::id("filter").to_string(), "id:filter");
    }

    #[test]
    fn test_from_str() {
        let by: By = "#login".into();
        assert!(matches!(by, By::Css(_)));
    }

    #[test]
    fn test_to_w3c() {
        assert_eq!(
            By::id("filter-by-location").to_w3c(),
            ("css selector", "[id=\"filter-by-location\"]".to_string())
        );
        assert_eq!(By::tag("option").to_w3c(), ("css selector", "option".to_string()));
        assert_eq!(By::xpath("//li").to_w3c(), ("xpath", "//li".to_string()));
        assert_eq!(By::link_text("Home").to_w3c(), ("link text", "Home".to_string()));
    }

    #[test]
    fn test_xpath_literal_plain() {
        assert_eq!(xpath_literal("Quality Assurance"), "'Quality Assurance'");
    }

    #[test]
    fn test_xpath_literal_single_quote() {
        assert_eq!(xpath_literal("O'Brien"), "\"O'Brien\"");
    }

    #[test]
    fn test_xpath_literal_both_quotes() {
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_value(By::css("h1")).unwrap();
        assert_eq!(json, serde_json::json!({"strategy": "css", "value": "h1"}));
    }
}
