//! Browser automation engine and authenticated sessions.
//!
//! Provides headless browser control and the cookie-based session
//! manager used by the extraction engine.

pub mod actions;
pub mod engine;
pub mod error;
pub mod session;

pub use actions::BrowserActions;
pub use engine::BrowserEngine;
pub use error::{AuthFailure, BrowserError, Result};
pub use session::{BrowserSession, CookieSessionManager, Session, SessionManager};
