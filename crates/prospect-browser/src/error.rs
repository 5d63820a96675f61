use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("script evaluation failed: {0}")]
    ScriptError(String),
}

impl BrowserError {
    /// True when the error is a bounded wait running out rather than a transport fault.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Why an authenticated session could not be established.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("browser could not be started: {0}")]
    Launch(String),

    #[error("navigation during login failed: {0}")]
    Navigation(String),

    #[error("credential cookie rejected: {0}")]
    Cookie(String),

    #[error("authenticated landmark '{selector}' did not appear within {waited_secs}s")]
    LandmarkMissing { selector: String, waited_secs: u64 },
}
