//! [`Session`] over a W3C WebDriver endpoint.
//!
//! Wraps a [`fantoccini::Client`]. Element references handed out by
//! [`find_elements`](Session::find_elements) are the driver's own W3C
//! references, so they pass through script arguments unchanged. Nothing is
//! cached: every call rebuilds the handle from its reference and the driver
//! decides whether it is still attached.
//!
//! # Example
//!
//! ```ignore
//! use careers_e2e::browser::WebDriverSession;
//!
//! let session = WebDriverSession::connect("http://localhost:4444").await?;
//! session.goto("https://example.test/").await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use fantoccini::actions::{InputSource, MOUSE_BUTTON_LEFT, MouseActions, PointerAction};
use fantoccini::elements::{Element as WdElement, ElementRef};
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::wd::WindowHandle as WdWindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, WindowHandle};

use super::selector::By;
use super::session::{Rect, Session};

// ============================================================================
// WebDriverSession
// ============================================================================

/// A browser session driven over W3C WebDriver.
pub struct WebDriverSession {
    client: Client,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession").finish_non_exhaustive()
    }
}

impl WebDriverSession {
    /// Opens a new browser session at `webdriver_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the endpoint refuses the session.
    pub async fn connect(webdriver_url: &str) -> Result<Arc<Self>> {
        let client = ClientBuilder::native()
            .connect(webdriver_url)
            .await
            .map_err(|e| Error::connection(format!("{webdriver_url}: {e}")))?;

        info!(endpoint = %webdriver_url, "WebDriver session opened");

        Ok(Arc::new(Self { client }))
    }

    /// Ends the browser session.
    pub async fn close(&self) -> Result<()> {
        self.client.clone().close().await.map_err(map_cmd_error)?;
        info!("WebDriver session closed");
        Ok(())
    }

    fn resolve(&self, id: &ElementId) -> WdElement {
        WdElement::from_element_id(self.client.clone(), element_ref(id))
    }

    /// Runs `op` on a resolved element, attributing errors to `id`.
    async fn on_element<T, F, Fut>(&self, id: &ElementId, op: F) -> Result<T>
    where
        F: FnOnce(WdElement) -> Fut,
        Fut: Future<Output = std::result::Result<T, CmdError>>,
    {
        op(self.resolve(id))
            .await
            .map_err(|e| map_element_error(e, id))
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

fn map_cmd_error(error: CmdError) -> Error {
    match &error {
        CmdError::Standard(wd) => match wd.error {
            ErrorStatus::NoSuchWindow => Error::webdriver(format!("no such window: {}", wd.message)),
            ErrorStatus::JavascriptError => Error::script_error(wd.message.to_string()),
            ErrorStatus::InvalidSessionId => Error::SessionClosed,
            _ => Error::webdriver(error.to_string()),
        },
        CmdError::Lost(_) => Error::SessionClosed,
        _ => Error::webdriver(error.to_string()),
    }
}

fn map_element_error(error: CmdError, id: &ElementId) -> Error {
    if let CmdError::Standard(wd) = &error {
        match wd.error {
            ErrorStatus::StaleElementReference | ErrorStatus::NoSuchElement => {
                return Error::stale_element(id.clone());
            }
            ErrorStatus::ElementClickIntercepted => {
                return Error::click_intercepted(id.clone(), wd.message.to_string());
            }
            _ => {}
        }
    }
    map_cmd_error(error)
}

fn element_ref(id: &ElementId) -> ElementRef {
    ElementRef::from(id.as_str().to_string())
}

fn element_ids(found: Vec<WdElement>) -> Vec<ElementId> {
    found
        .into_iter()
        .map(|element| ElementId::new(element.element_id().to_string()))
        .collect()
}

fn to_locator<'a>(strategy: &str, value: &'a str) -> Locator<'a> {
    match strategy {
        "xpath" => Locator::XPath(value),
        "link text" => Locator::LinkText(value),
        _ => Locator::Css(value),
    }
}

// ============================================================================
// Session
// ============================================================================

#[async_trait]
impl Session for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.client.goto(url).await.map_err(map_cmd_error)?;
        debug!(url = %url, "Navigated");
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.client.current_url().await.map_err(map_cmd_error)?;
        Ok(url.to_string())
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<ElementId>> {
        let (strategy, value) = by.to_w3c();
        let found = self
            .client
            .find_all(to_locator(strategy, &value))
            .await
            .map_err(map_cmd_error)?;
        Ok(element_ids(found))
    }

    async fn find_elements_in(&self, parent: &ElementId, by: &By) -> Result<Vec<ElementId>> {
        let (strategy, value) = by.to_w3c();
        let found = self
            .on_element(parent, |element| async move {
                element.find_all(to_locator(strategy, &value)).await
            })
            .await?;
        Ok(element_ids(found))
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.on_element(element, |e| async move { e.is_displayed().await })
            .await
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.on_element(element, |e| async move { e.is_enabled().await })
            .await
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        self.on_element(element, |e| async move { e.is_selected().await })
            .await
    }

    async fn rect(&self, element: &ElementId) -> Result<Rect> {
        let (x, y, width, height) = self
            .on_element(element, |e| async move { e.rectangle().await })
            .await?;
        Ok(Rect::new(x, y, width, height))
    }

    async fn tag_name(&self, element: &ElementId) -> Result<String> {
        let tag = self
            .on_element(element, |e| async move { e.tag_name().await })
            .await?;
        Ok(tag.to_ascii_lowercase())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.on_element(element, |e| async move { e.text().await })
            .await
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.on_element(element, |e| async move { e.click().await })
            .await
    }

    async fn pointer_click(&self, element: &ElementId) -> Result<()> {
        let target = self.resolve(element);
        let gesture = MouseActions::new("mouse".to_string())
            .then(PointerAction::MoveToElement {
                element: target,
                duration: None,
                x: Default::default(),
                y: Default::default(),
            })
            .then(PointerAction::Down {
                button: MOUSE_BUTTON_LEFT,
            })
            .then(PointerAction::Up {
                button: MOUSE_BUTTON_LEFT,
            });

        let performed = self.client.perform_actions(gesture).await;
        let released = self.client.release_actions().await;
        performed.map_err(|e| map_element_error(e, element))?;
        released.map_err(map_cmd_error)
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let target = args.iter().find_map(ElementId::from_script_arg);
        self.client.execute(script, args).await.map_err(|e| match &target {
            Some(id) => map_element_error(e, id),
            None => map_cmd_error(e),
        })
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        let handles = self.client.windows().await.map_err(map_cmd_error)?;
        Ok(handles
            .into_iter()
            .map(|h| WindowHandle::new(String::from(h)))
            .collect())
    }

    async fn current_window(&self) -> Result<WindowHandle> {
        let handle = self.client.window().await.map_err(map_cmd_error)?;
        Ok(WindowHandle::new(String::from(handle)))
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let wd_handle = WdWindowHandle::try_from(handle.as_str().to_string())
            .map_err(|_| Error::no_such_window(handle.clone()))?;
        self.client
            .switch_to_window(wd_handle)
            .await
            .map_err(|e| match &e {
                CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::NoSuchWindow) => {
                    Error::no_such_window(handle.clone())
                }
                _ => map_cmd_error(e),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref_keeps_driver_reference() {
        let id = ElementId::new("f.2B1C.d.61A3.e.12");
        let reference = element_ref(&id);
        assert_eq!(reference.to_string(), id.as_str());
        assert_eq!(ElementId::new(reference.to_string()), id);
    }

    #[test]
    fn test_locator_mapping() {
        assert!(matches!(to_locator("xpath", "//a"), Locator::XPath("//a")));
        assert!(matches!(to_locator("link text", "Apply"), Locator::LinkText("Apply")));
        assert!(matches!(to_locator("css selector", "#id"), Locator::Css("#id")));
    }
}
