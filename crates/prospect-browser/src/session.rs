//! Cookie-authenticated browsing sessions.
//!
//! A session is created from one opaque credential token, is never
//! re-authenticated, and must be released exactly once when the run ends.

use crate::actions::{extract_domain, BrowserActions};
use crate::engine::BrowserEngine;
use crate::error::{AuthFailure, Result};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use prospect_core::{BrowserConfig, CredentialToken, SessionConfig};
use std::time::Duration;

/// An authenticated context scoped to a single run.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Tear the context down. Consumes the session so it cannot be reused.
    async fn release(self);
}

/// Establishes authenticated sessions from credential tokens.
///
/// One outbound navigation per call, no retries; retry policy belongs to the caller.
#[async_trait::async_trait]
pub trait SessionManager: Send + Sync {
    /// Session type handed to page fetchers.
    type Session: Session;

    /// Open a context, inject the credential and wait for the authenticated landmark.
    async fn establish(
        &self,
        token: &CredentialToken,
    ) -> std::result::Result<Self::Session, AuthFailure>;
}

/// Session backed by its own browser process and tab.
pub struct BrowserSession {
    engine: BrowserEngine,
    page: Page,
}

#[async_trait::async_trait]
impl Session for BrowserSession {
    async fn release(self) {
        let Self { engine, page } = self;
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close session tab: {}", e);
        }
        engine.close().await;
        tracing::info!("Session released");
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        BrowserActions::navigate(&self.page, url).await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        BrowserActions::wait_for_selector(&self.page, selector, timeout).await
    }

    async fn has_selector(&self, selector: &str) -> Result<bool> {
        BrowserActions::has_selector(&self.page, selector).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        BrowserActions::click(&self.page, selector).await
    }

    async fn scroll_to_bottom(&self) -> Result<u64> {
        BrowserActions::scroll_to_bottom(&self.page).await
    }

    async fn content(&self) -> Result<String> {
        BrowserActions::content(&self.page).await
    }
}

/// Logs in by injecting the credential as the site's session cookie.
pub struct CookieSessionManager {
    browser: BrowserConfig,
    session: SessionConfig,
}

impl CookieSessionManager {
    /// Create a manager; each established session launches its own browser.
    #[must_use]
    pub fn new(browser: BrowserConfig, session: SessionConfig) -> Self {
        Self { browser, session }
    }

    fn cookie_domain(&self) -> std::result::Result<String, AuthFailure> {
        if self.session.cookie_domain.trim().is_empty() {
            extract_domain(&self.session.home_url)
                .map_err(|e| AuthFailure::Navigation(e.to_string()))
        } else {
            Ok(self.session.cookie_domain.clone())
        }
    }

    async fn authenticate(
        &self,
        page: &Page,
        token: &CredentialToken,
    ) -> std::result::Result<(), AuthFailure> {
        BrowserActions::navigate(page, &self.session.home_url)
            .await
            .map_err(|e| AuthFailure::Navigation(e.to_string()))?;

        let cookie = CookieParam::builder()
            .name(self.session.cookie_name.clone())
            .value(token.expose())
            .domain(self.cookie_domain()?)
            .path("/")
            .build()
            .map_err(AuthFailure::Cookie)?;
        page.set_cookie(cookie)
            .await
            .map_err(|e| AuthFailure::Cookie(e.to_string()))?;

        page.reload()
            .await
            .map_err(|e| AuthFailure::Navigation(e.to_string()))?;

        BrowserActions::wait_for_selector(
            page,
            &self.session.landmark_selector,
            self.session.auth_timeout(),
        )
        .await
        .map_err(|e| {
            if e.is_timeout() {
                AuthFailure::LandmarkMissing {
                    selector: self.session.landmark_selector.clone(),
                    waited_secs: self.session.auth_timeout_secs,
                }
            } else {
                AuthFailure::Navigation(e.to_string())
            }
        })
    }
}

#[async_trait::async_trait]
impl SessionManager for CookieSessionManager {
    type Session = BrowserSession;

    async fn establish(
        &self,
        token: &CredentialToken,
    ) -> std::result::Result<BrowserSession, AuthFailure> {
        tracing::info!("Establishing session with {:?}", token);

        let engine = BrowserEngine::launch(&self.browser)
            .await
            .map_err(|e| AuthFailure::Launch(e.to_string()))?;

        let page = match engine.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                engine.close().await;
                return Err(AuthFailure::Launch(e.to_string()));
            }
        };

        match self.authenticate(&page, token).await {
            Ok(()) => {
                tracing::info!("Session authenticated");
                Ok(BrowserSession { engine, page })
            }
            Err(failure) => {
                tracing::error!("Login failed: {}", failure);
                BrowserSession { engine, page }.release().await;
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_domain_from_config() {
        let manager = CookieSessionManager::new(BrowserConfig::default(), SessionConfig::default());
        assert_eq!(manager.cookie_domain().unwrap(), ".linkedin.com");
    }

    #[test]
    fn test_cookie_domain_falls_back_to_home_host() {
        let session = SessionConfig {
            cookie_domain: String::new(),
            home_url: "https://social.example.com/".to_string(),
            ..SessionConfig::default()
        };
        let manager = CookieSessionManager::new(BrowserConfig::default(), session);
        assert_eq!(manager.cookie_domain().unwrap(), "social.example.com");
    }
}
