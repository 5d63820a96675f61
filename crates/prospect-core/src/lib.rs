//! Prospect Core - Foundation crate for the Prospect extraction engine.
//!
//! This crate provides shared types, error handling, and configuration
//! management that all other Prospect crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared domain types (`Query`, `FilterSet`, `RawRecord`, `IdentityKey`)
//!
//! # Example
//!
//! ```rust
//! use prospect_core::{AppConfig, Query, QueryField};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let query = Query::new().with(QueryField::Keywords, "software engineer");
//! assert!(!query.is_blank());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CommentSelectors, LlmConfig, ProfileSelectors, ScrapingConfig,
    SelectorConfig, ServiceConfig, SessionConfig, StorageConfig,
};
pub use error::{ConfigError, ConfigResult, ProspectError, Result};
pub use types::{
    CommentRecord, ComplianceRecord, CredentialToken, FilterSet, FilterValue, IdentityKey,
    ProfileRecord, Query, QueryField, RawRecord, RecordKind, Timestamp,
};
