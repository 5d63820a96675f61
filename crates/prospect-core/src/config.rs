//! Configuration management for Prospect.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/prospect/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Authenticated session settings
    pub session: SessionConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Pagination and throttling settings
    pub scraping: ScrapingConfig,
    /// CSS selectors for result extraction
    pub selectors: SelectorConfig,
    /// Request-level settings (timeouts, export)
    pub service: ServiceConfig,
    /// Query translation settings
    pub llm: LlmConfig,
    /// Record storage settings
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PROSPECT_HEADLESS`: Override browser headless mode (true/false)
    /// - `PROSPECT_PAGE_CEILING`: Override the maximum number of result pages
    /// - `PROSPECT_LLM_ENABLED`: Override LLM query translation (true/false)
    /// - `PROSPECT_LLM_API_KEY`: API key for the translation provider
    /// - `PROSPECT_DATABASE_PATH`: Override the record database location
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// The lookup is injected so overrides can be exercised without touching
    /// the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("PROSPECT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("PROSPECT_PAGE_CEILING") {
            if let Ok(ceiling) = val.parse() {
                self.scraping.page_ceiling = ceiling;
                tracing::debug!("Override scraping.page_ceiling from env: {}", ceiling);
            }
        }

        if let Some(val) = lookup("PROSPECT_LLM_ENABLED") {
            if let Ok(enabled) = val.parse() {
                self.llm.enabled = enabled;
                tracing::debug!("Override llm.enabled from env: {}", enabled);
            }
        }

        if let Some(key) = lookup("PROSPECT_LLM_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
                tracing::debug!("LLM API key provided via env");
            }
        }

        if let Some(path) = lookup("PROSPECT_DATABASE_PATH") {
            tracing::debug!("Override storage.database_path from env: {}", path);
            self.storage.database_path = PathBuf::from(path);
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scraping.page_ceiling == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.page_ceiling".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.scraping.fetch_delay_min_ms > self.scraping.fetch_delay_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "scraping.fetch_delay_min_ms".to_string(),
                reason: "must not exceed fetch_delay_max_ms".to_string(),
            });
        }

        if self.scraping.page_delay_min_ms > self.scraping.page_delay_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "scraping.page_delay_min_ms".to_string(),
                reason: "must not exceed page_delay_max_ms".to_string(),
            });
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session.cookie_name".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/prospect/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "prospect", "prospect").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/prospect`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "prospect", "prospect").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Authenticated session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Page opened before the credential cookie is injected
    pub home_url: String,
    /// Name of the session cookie carrying the credential
    pub cookie_name: String,
    /// Domain the session cookie is scoped to
    pub cookie_domain: String,
    /// Element that only renders for an authenticated member
    pub landmark_selector: String,
    /// How long to wait for the landmark after refresh, in seconds
    pub auth_timeout_secs: u64,
}

impl SessionConfig {
    /// Bounded wait for the post-authentication landmark.
    #[must_use]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            home_url: "https://www.linkedin.com/".to_string(),
            cookie_name: "li_at".to_string(),
            cookie_domain: ".linkedin.com".to_string(),
            landmark_selector: ".global-nav__primary-link".to_string(),
            auth_timeout_secs: 30,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
        }
    }
}

/// Pagination and throttling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Base locator for people search; compiled queries are appended to it
    pub search_base_url: String,
    /// Maximum number of result pages fetched per run
    pub page_ceiling: u32,
    /// Lower bound of the mandatory pre-fetch delay, in milliseconds
    pub fetch_delay_min_ms: u64,
    /// Upper bound of the mandatory pre-fetch delay, in milliseconds
    pub fetch_delay_max_ms: u64,
    /// Lower bound of the delay between pages, in milliseconds
    pub page_delay_min_ms: u64,
    /// Upper bound of the delay between pages, in milliseconds
    pub page_delay_max_ms: u64,
    /// How long to wait for the result container, in seconds
    pub landmark_wait_secs: u64,
    /// Maximum "load more" expansions on a comment thread
    pub max_load_more_rounds: u32,
    /// Post locators must start with this prefix
    pub allowed_post_prefix: String,
}

impl ScrapingConfig {
    /// Bounded wait for the result container landmark.
    #[must_use]
    pub fn landmark_wait(&self) -> Duration {
        Duration::from_secs(self.landmark_wait_secs)
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            search_base_url: "https://www.linkedin.com/search/results/people/".to_string(),
            page_ceiling: 3,
            fetch_delay_min_ms: 1000,
            fetch_delay_max_ms: 4000,
            page_delay_min_ms: 1000,
            page_delay_max_ms: 2000,
            landmark_wait_secs: 30,
            max_load_more_rounds: 20,
            allowed_post_prefix: "https://www.linkedin.com/".to_string(),
        }
    }
}

/// CSS selectors for both record variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// People-search result selectors
    pub profiles: ProfileSelectors,
    /// Post comment selectors
    pub comments: CommentSelectors,
}

/// Selectors for one people-search result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSelectors {
    /// Each matching element is one search result
    pub result_item: String,
    /// Present when the site rendered an explicit "no results" state
    pub no_results: String,
    pub name: String,
    pub title: String,
    pub location: String,
    /// Anchor whose `href` is the profile locator
    pub profile_url: String,
}

impl Default for ProfileSelectors {
    fn default() -> Self {
        Self {
            result_item: ".reusable-search__result-container".to_string(),
            no_results: ".search-reusable-search-no-results".to_string(),
            name: ".actor-name".to_string(),
            title: ".subline-level-1".to_string(),
            location: ".subline-level-2".to_string(),
            profile_url: ".app-aware-link".to_string(),
        }
    }
}

/// Selectors for a post's comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSelectors {
    /// Each matching element is one comment
    pub comment_item: String,
    pub name: String,
    pub comment: String,
    pub timestamp: String,
    pub likes: String,
    /// Button that expands the thread with older comments
    pub load_more: String,
}

impl Default for CommentSelectors {
    fn default() -> Self {
        Self {
            comment_item: ".comments-comment-item".to_string(),
            name: ".comments-post-meta__name-text".to_string(),
            comment: ".comments-comment-item__main-content".to_string(),
            timestamp: ".comments-comment-item__timestamp".to_string(),
            likes: ".comments-comment-social-bar__social-counts".to_string(),
            load_more: "button.comments-comments-list__load-more-comments-button".to_string(),
        }
    }
}

/// Request-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Overall budget for a people-search run, in seconds
    pub search_timeout_secs: u64,
    /// Overall budget for a comment run, in seconds
    pub comments_timeout_secs: u64,
    /// Directory CSV exports are written to
    pub export_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: 300,
            comments_timeout_secs: 420,
            export_dir: PathBuf::from("."),
        }
    }
}

/// Query translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether free-text queries are sent to the LLM
    pub enabled: bool,
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Model used for translation
    pub model: String,
    /// API key (read from the environment, never persisted)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Maximum tokens for the translation completion
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            max_tokens: 150,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Record storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Whether extracted records are appended to the database
    pub enabled: bool,
    /// `SQLite` database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: PathBuf::from("prospect.db"),
        }
    }
}
