//! [`BrowserDriver`] backed by a local Chrome over CDP.

use std::fmt::Display;
use std::path::Path;
use std::pin::pin;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, EventFrameNavigated,
};
use chromiumoxide::page::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::BrowserDriver;
use crate::error::DriverError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChromiumDriver {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launches Chrome and opens a blank page.
    pub async fn launch(headless: bool) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1366, 768)
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(DriverError::Browser)?;

        info!(headless, "Launching browser");
        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(browser_err(e));
            }
        };

        Ok(Self {
            browser: Some(browser),
            page,
            handler,
        })
    }
}

fn browser_err(e: impl Display) -> DriverError {
    DriverError::Browser(e.to_string())
}

/// Clicks, waits for the next main-frame navigation, then for that page to load.
///
/// `navigations` must be subscribed before `click` runs; it yields `true` for
/// main-frame navigations. The whole sequence shares one timeout.
async fn await_navigation<E, C, S>(
    navigations: E,
    click: C,
    settle: S,
    timeout: Duration,
    what: &str,
) -> Result<(), DriverError>
where
    E: Stream<Item = bool>,
    C: Future<Output = Result<(), DriverError>>,
    S: Future<Output = Result<(), DriverError>>,
{
    let mut navigations = pin!(navigations);
    let sequence = async {
        click.await?;
        loop {
            match navigations.next().await {
                Some(true) => break,
                Some(false) => continue,
                None => return Err(DriverError::Browser("navigation event stream closed".to_string())),
            }
        }
        settle.await
    };
    match tokio::time::timeout(timeout, sequence).await {
        Ok(result) => result,
        Err(_) => Err(timeout_err(what, timeout)),
    }
}

fn timeout_err(what: impl Into<String>, after: Duration) -> DriverError {
    DriverError::Timeout {
        what: what.into(),
        after,
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open(&mut self, url: &str) -> Result<(), DriverError> {
        debug!(url, "Opening page");
        self.page.goto(url).await.map_err(browser_err)?;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(browser_err)?;
        element.type_str(text).await.map_err(browser_err)?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(browser_err)?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                debug!(selector, elapsed = ?start.elapsed(), "Selector present");
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(timeout_err(format!("selector {selector}"), timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), DriverError> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(browser_err(e)),
            Err(_) => Err(timeout_err("navigation", timeout)),
        }
    }

    async fn click_and_wait_for_navigation(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;

        // subscribed before the click, so the navigation it triggers is always observed
        let navigations = self
            .page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(browser_err)?
            .map(|event| event.frame.parent_id.is_none());
        let click = async { element.click().await.map(|_| ()).map_err(browser_err) };
        let settle = async { self.page.wait_for_navigation().await.map(|_| ()).map_err(browser_err) };

        let what = format!("navigation after clicking {selector}");
        await_navigation(navigations, click, settle, timeout, &what).await
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.page
            .url()
            .await
            .map_err(browser_err)?
            .ok_or_else(|| DriverError::Browser("page has no URL".to_string()))
    }

    async fn content(&mut self) -> Result<String, DriverError> {
        self.page.content().await.map_err(browser_err)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let bytes = self.page.screenshot(params).await.map_err(browser_err)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = browser.close().await.map_err(browser_err);
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {e}");
        }
        self.handler.abort();
        info!("Browser closed");
        closed.map(|_| ())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        if self.browser.is_some() {
            error!("ChromiumDriver dropped without close(); killing browser");
        }
        self.handler.abort();
    }
}
