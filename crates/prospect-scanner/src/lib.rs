//! Prospect Scanner - authenticated, paginated extraction engine.
//!
//! This crate turns a structured query (or a post locator) into records. It
//! compiles search locators, fetches pages through an authenticated session,
//! extracts and deduplicates records page by page, and hands the annotated
//! result to storage and export.
//!
//! # Features
//!
//! - One session per run, released exactly once on every exit path
//! - Randomized pre-fetch and inter-page delays
//! - Typed page outcomes (`Loaded`, `Empty`, `Timeout`, `Fatal`)
//! - Overall run budget that discards partial results on expiry
//! - Compliance annotation, SQLite storage and CSV export
//!
//! # Example
//!
//! ```rust,ignore
//! use prospect_scanner::{BrowserPageFetcher, ExtractionService, SearchRequest};
//!
//! let config = AppConfig::load_with_env()?;
//! let sessions = CookieSessionManager::new(config.browser.clone(), config.session.clone());
//! let fetcher = BrowserPageFetcher::new(&config.scraping, &config.selectors);
//! let service = ExtractionService::new(&config, sessions, fetcher, translator)?;
//!
//! let response = service.search(request).await;
//! println!("{}", response.message);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod compliance;
pub mod delay;
#[allow(missing_docs)]
pub mod error;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod orchestrator;
pub mod parser;
#[allow(missing_docs)]
pub mod service;
pub mod sink;
pub mod url_builder;

// Re-export commonly used types
pub use compliance::annotate;
pub use delay::DelayPolicy;
pub use error::{Result, ScanError};
pub use export::{CsvExporter, RecordExporter};
pub use fetcher::{BrowserPageFetcher, PageFetcher, PageOutcome, PageRequest};
pub use filter::{apply_filters, deduplicate, post_process, Deduplicator};
pub use orchestrator::{LocatorPlan, PaginationController, RunPlan, RunReport, RunState, RunStatus};
pub use parser::{Extraction, RecordExtractor};
pub use service::{
    CommentsRequest, ExtractionResponse, ExtractionService, QueryInput, ResponseStatus,
    SearchRequest,
};
pub use sink::RecordSink;
pub use url_builder::build_search_url;
