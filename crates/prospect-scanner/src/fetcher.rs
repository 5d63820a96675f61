//! Page fetching and outcome classification.
//!
//! A fetch always waits out the throttle delay first, then navigates with the
//! run's session and classifies the page by its landmarks.

use crate::delay::DelayPolicy;
use async_trait::async_trait;
use prospect_browser::BrowserActions;
use prospect_core::{CommentSelectors, ProfileSelectors, RecordKind, ScrapingConfig, SelectorConfig};
use std::fmt;
use std::time::Duration;

/// Pause after each scroll or "load more" click so new comments can render.
const EXPAND_SETTLE: Duration = Duration::from_millis(1500);

/// Result of fetching one page.
#[derive(Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Result container present; carries the serialized document
    Loaded(String),
    /// Page reachable and explicitly empty
    Empty,
    /// Neither results nor the empty marker appeared within the bounded wait
    Timeout,
    /// Unrecoverable transport or navigation failure
    Fatal(String),
}

impl fmt::Debug for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(html) => write!(f, "Loaded({} bytes)", html.len()),
            Self::Empty => f.write_str("Empty"),
            Self::Timeout => f.write_str("Timeout"),
            Self::Fatal(cause) => write!(f, "Fatal({cause})"),
        }
    }
}

/// One page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Fully-qualified locator
    pub locator: String,
    /// Record variant the page holds
    pub kind: RecordKind,
    /// 1-based page number within the run
    pub page_index: u32,
}

/// Fetches pages with an authenticated session of type `S`.
#[async_trait]
pub trait PageFetcher<S: Sync + ?Sized>: Send + Sync {
    /// Fetch and classify one page. Never fails; failures are outcomes.
    async fn fetch(&self, session: &S, request: &PageRequest) -> PageOutcome;
}

/// Fetcher driving a browser session.
#[derive(Debug, Clone)]
pub struct BrowserPageFetcher {
    delay: DelayPolicy,
    landmark_wait: Duration,
    max_load_more_rounds: u32,
    profiles: ProfileSelectors,
    comments: CommentSelectors,
}

impl BrowserPageFetcher {
    /// Create a fetcher from scraping settings and selectors.
    #[must_use]
    pub fn new(scraping: &ScrapingConfig, selectors: &SelectorConfig) -> Self {
        Self {
            delay: DelayPolicy::from_millis(scraping.fetch_delay_min_ms, scraping.fetch_delay_max_ms),
            landmark_wait: scraping.landmark_wait(),
            max_load_more_rounds: scraping.max_load_more_rounds,
            profiles: selectors.profiles.clone(),
            comments: selectors.comments.clone(),
        }
    }

    /// Replace the pre-fetch delay policy.
    #[must_use]
    pub fn with_delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    fn landmark(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Profile => &self.profiles.result_item,
            RecordKind::Comment => &self.comments.comment_item,
        }
    }

    fn empty_marker(&self, kind: RecordKind) -> Option<&str> {
        let marker = match kind {
            RecordKind::Profile => Some(self.profiles.no_results.as_str()),
            RecordKind::Comment => None,
        };
        marker.filter(|marker| !marker.trim().is_empty())
    }

    /// Scroll and click "load more" until the control disappears or the round
    /// budget runs out. Failures stop expansion but keep what is on the page.
    async fn expand_thread<S: BrowserActions + ?Sized>(&self, session: &S) {
        let mut rounds = 0;
        while rounds < self.max_load_more_rounds {
            if let Err(e) = session.scroll_to_bottom().await {
                tracing::debug!("Scroll failed during thread expansion: {}", e);
                break;
            }
            tokio::time::sleep(EXPAND_SETTLE).await;

            match session.has_selector(&self.comments.load_more).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::debug!("Load-more lookup failed: {}", e);
                    break;
                }
            }
            if let Err(e) = session.click(&self.comments.load_more).await {
                tracing::debug!("Load-more click failed: {}", e);
                break;
            }
            rounds += 1;
            tokio::time::sleep(EXPAND_SETTLE).await;
        }
        tracing::debug!("Expanded comment thread in {} rounds", rounds);
    }
}

#[async_trait]
impl<S> PageFetcher<S> for BrowserPageFetcher
where
    S: BrowserActions + ?Sized,
{
    async fn fetch(&self, session: &S, request: &PageRequest) -> PageOutcome {
        self.delay.pause().await;

        tracing::info!("Fetching page {}: {}", request.page_index, request.locator);
        if let Err(e) = session.navigate(&request.locator).await {
            tracing::error!("Navigation to {} failed: {}", request.locator, e);
            return PageOutcome::Fatal(e.to_string());
        }

        let landmark = self.landmark(request.kind);
        let marker = self.empty_marker(request.kind);
        let awaited = match marker {
            Some(marker) => format!("{landmark}, {marker}"),
            None => landmark.to_string(),
        };

        match session.wait_for_selector(&awaited, self.landmark_wait).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                tracing::warn!("No results landmark on page {}: {}", request.page_index, e);
                return PageOutcome::Timeout;
            }
            Err(e) => return PageOutcome::Fatal(e.to_string()),
        }

        if let Some(marker) = marker {
            match session.has_selector(landmark).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!("Page {} reports no results", request.page_index);
                    return PageOutcome::Empty;
                }
                Err(e) => {
                    tracing::debug!("Could not confirm '{}' over '{}': {}", landmark, marker, e);
                    return PageOutcome::Empty;
                }
            }
        }

        if request.kind == RecordKind::Comment {
            self.expand_thread(session).await;
        }

        match session.content().await {
            Ok(html) => PageOutcome::Loaded(html),
            Err(e) => {
                tracing::error!("Could not read page {}: {}", request.page_index, e);
                PageOutcome::Fatal(e.to_string())
            }
        }
    }
}
