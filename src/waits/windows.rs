//! Following links that open a new window or tab.

use tracing::debug;

use crate::error::Result;
use crate::identifiers::WindowHandle;

use super::{Waits, conditions};

impl Waits {
    /// Waits for a window other than `original` and switches to it.
    ///
    /// Returns the handle of the window now receiving commands.
    pub async fn switch_to_new_window(&self, original: &WindowHandle) -> Result<WindowHandle> {
        let handle = self.until(&conditions::window_other_than(original)).await?;
        self.session.switch_to_window(&handle).await?;
        debug!(from = %original, to = %handle, "Switched to new window");
        Ok(handle)
    }

    /// Switches to a newly opened window if there is one right now.
    ///
    /// Returns `None`, without waiting, when `original` is the only window.
    pub async fn follow_new_window(&self, original: &WindowHandle) -> Result<Option<WindowHandle>> {
        if self.session.window_handles().await?.len() > 1 {
            self.switch_to_new_window(original).await.map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Session;
    use crate::mock::FakeSession;

    #[tokio::test(start_paused = true)]
    async fn test_switch_to_new_window() {
        let fake = FakeSession::new("https://example.test/careers/open-positions/");
        let waits = Waits::new(fake.clone());
        let original = fake.current_window().await.unwrap();

        assert_eq!(waits.follow_new_window(&original).await.unwrap(), None);

        let popup = fake.open_window("https://jobs.lever.co/acme/123");
        let switched = waits.follow_new_window(&original).await.unwrap();

        assert_eq!(switched, Some(popup.clone()));
        assert_eq!(fake.current_window().await.unwrap(), popup);
        assert_eq!(fake.current_url().await.unwrap(), "https://jobs.lever.co/acme/123");
    }
}
