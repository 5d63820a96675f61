//! Application state management.

use anyhow::Context;
use prospect_browser::CookieSessionManager;
use prospect_core::AppConfig;
use prospect_db::Database;
use prospect_llm::translator_from_config;
use prospect_scanner::{BrowserPageFetcher, ExtractionService};
use std::sync::Arc;

/// Extraction service wired to a real browser.
pub type BrowserService = ExtractionService<CookieSessionManager, BrowserPageFetcher>;

/// Everything a request needs, built once from configuration.
pub struct AppState {
    /// Loaded configuration
    pub config: AppConfig,

    /// Service handling search and comment requests
    pub service: BrowserService,

    /// Record store, present when storage is enabled
    pub database: Option<Database>,
}

impl AppState {
    /// Wire sessions, fetcher, translator and (optionally) the database.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let sessions = CookieSessionManager::new(config.browser.clone(), config.session.clone());
        let fetcher = BrowserPageFetcher::new(&config.scraping, &config.selectors);
        let translator = translator_from_config(&config.llm);

        let mut service = ExtractionService::new(&config, sessions, fetcher, translator)
            .context("failed to build extraction service")?;

        let database = if config.storage.enabled {
            if let Some(parent) = config.storage.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
            let db = Database::open(&config.storage.database_path)
                .await
                .context("failed to open record database")?;
            tracing::info!("Storing records in {}", config.storage.database_path.display());
            service = service.with_sink(Arc::new(db.clone()));
            Some(db)
        } else {
            None
        };

        Ok(Self {
            config,
            service,
            database,
        })
    }

    /// Close the database pool, if any.
    pub async fn shutdown(self) {
        if let Some(db) = self.database {
            db.close().await;
        }
    }
}
