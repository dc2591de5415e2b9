//! Type-safe identifiers for browser entities.
//!
//! Newtype wrappers keep element references and window handles from being
//! mixed up with each other or with plain strings.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Key under which W3C WebDriver serializes element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// ============================================================================
// ElementId
// ============================================================================

/// Opaque reference to a DOM node resolved at a point in time.
///
/// An `ElementId` is only meaningful while its node is attached. Once the page
/// re-renders, every session operation on it fails with
/// [`Error::StaleElement`](crate::Error::StaleElement).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Arc<str>);

impl ElementId {
    /// Wraps an existing reference string.
    #[inline]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Mints a fresh random reference.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Returns the reference string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes this reference as a script argument.
    #[must_use]
    pub fn to_script_arg(&self) -> Value {
        json!({ ELEMENT_KEY: self.as_str() })
    }

    /// Decodes a script argument produced by [`to_script_arg`](Self::to_script_arg).
    #[must_use]
    pub fn from_script_arg(value: &Value) -> Option<Self> {
        value.get(ELEMENT_KEY).and_then(Value::as_str).map(Self::new)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// WindowHandle
// ============================================================================

/// Handle of a top-level browsing context (window or tab).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(String);

impl WindowHandle {
    /// Wraps an existing handle string.
    #[inline]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Mints a fresh random handle.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the handle string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
