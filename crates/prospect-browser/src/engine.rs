use crate::actions::BrowserActions;
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use prospect_core::BrowserConfig;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Interval between DOM polls while waiting for a selector.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Headless browser process owned by a single session.
///
/// The CDP handler task is tracked so it can be stopped with the browser.
pub struct BrowserEngine {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch a new browser process.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));
        if !config.headless {
            builder = builder.with_head();
        }
        let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        tracing::debug!("Browser launched (headless: {})", config.headless);
        Ok(Self { browser, handler })
    }

    /// Open a new tab at `url`.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        self.browser
            .new_page(url)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        tracing::debug!("Browser closed");
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl BrowserActions for Page {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        self.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.find_element(selector).await.is_ok() {
                tracing::trace!("Selector {} found after {:?}", selector, start.elapsed());
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(BrowserError::Timeout(format!(
                    "'{selector}' not present after {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn has_selector(&self, selector: &str) -> Result<bool> {
        let elements = self
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(!elements.is_empty())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<u64> {
        self.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        self.evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?
            .into_value::<u64>()
            .map_err(|e| BrowserError::ScriptError(e.to_string()))
    }

    async fn content(&self) -> Result<String> {
        Page::content(self)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }
}
