//! Browser driver seam.
//!
//! The scrape engine never touches a browser directly. It drives one session
//! through [`BrowserDriver`]; [`ChromiumDriver`] is the production
//! implementation and tests plug in scripted fakes.

mod chromium;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Diagnostics;
use crate::error::DriverError;

pub use chromium::ChromiumDriver;

/// One open browser page.
///
/// Every method suspends until the browser reports completion; these calls
/// are the only await points of a scrape.
#[async_trait]
pub trait BrowserDriver: Send {
    async fn open(&mut self, url: &str) -> Result<(), DriverError>;

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), DriverError>;

    async fn click(&mut self, selector: &str) -> Result<(), DriverError>;

    /// Blocks until `selector` matches, or fails with [`DriverError::Timeout`].
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), DriverError>;

    /// Clicks `selector` with navigation events already subscribed, so a fast
    /// navigation triggered by the click cannot be missed.
    async fn click_and_wait_for_navigation(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// Rendered DOM of the current page as HTML.
    async fn content(&mut self) -> Result<String, DriverError>;

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Saves a screenshot under the diagnostics directory when diagnostics are on.
///
/// Failures are logged and swallowed: a missing screenshot never aborts a run.
pub async fn capture<D: BrowserDriver + ?Sized>(driver: &mut D, diagnostics: &Diagnostics, name: &str) {
    if !diagnostics.enabled {
        return;
    }
    let path = diagnostics.dir.join(name);
    match driver.screenshot(&path).await {
        Ok(()) => debug!(path = %path.display(), "Screenshot saved"),
        Err(e) => warn!(path = %path.display(), "Could not save screenshot: {e}"),
    }
}
