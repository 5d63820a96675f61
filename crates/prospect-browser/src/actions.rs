use crate::error::{BrowserError, Result};
use std::time::Duration;

/// Browser actions a page fetcher needs from an authenticated session
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and wait for the document to load
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for a selector to appear, polling until `timeout`
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Check for a selector without waiting
    async fn has_selector(&self, selector: &str) -> Result<bool>;

    /// Click the first element matching a selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Scroll to the bottom of the document and return the new scroll height
    async fn scroll_to_bottom(&self) -> Result<u64>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}
