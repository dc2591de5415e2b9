//! Script sources issued through [`Session::execute_script`].
//!
//! The engine only ever runs these fixed snippets. Element arguments arrive
//! as `arguments[0]`.
//!
//! [`Session::execute_script`]: super::Session::execute_script

/// Centers the element in the viewport without animation.
pub const SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({behavior: 'auto', block: 'center', inline: 'nearest'});";

/// Dispatches a click event from the page itself.
///
/// Bypasses hit-testing, so an occluding overlay cannot intercept it.
pub const CLICK: &str = "arguments[0].click();";

/// Reads `document.readyState`.
pub const READY_STATE: &str = "return document.readyState";

/// Escapes a string for safe use in JavaScript.
pub(crate) fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_escapes_quotes() {
        assert_eq!(json_string(r#"say "hi""#), r#""say \"hi\"""#);
    }

    #[test]
    fn test_scripts_reference_first_argument() {
        assert!(SCROLL_INTO_VIEW.starts_with("arguments[0]"));
        assert!(CLICK.starts_with("arguments[0]"));
    }
}
