//! Pagination controller for extraction runs.
//!
//! A run authenticates once, then alternates fetching and extracting pages
//! until the page source is exhausted, the page ceiling is reached, or a
//! terminal failure occurs. The session is released exactly once on every
//! path, including when the overall run budget expires.

use crate::delay::DelayPolicy;
use crate::fetcher::{PageFetcher, PageOutcome, PageRequest};
use crate::filter::Deduplicator;
use crate::parser::RecordExtractor;
use crate::url_builder::build_search_url;
use prospect_browser::{Session, SessionManager};
use prospect_core::{CredentialToken, FilterSet, Query, RawRecord, RecordKind};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Where a run's pages come from.
#[derive(Debug, Clone)]
pub enum LocatorPlan {
    /// Paginated people search compiled from a query
    Search {
        /// Base search locator
        base_url: String,
        /// Structured query
        query: Query,
        /// Filters appended to the locator
        filters: Option<FilterSet>,
    },
    /// A single locator with no pagination
    Single(String),
}

impl LocatorPlan {
    /// Locator for a 1-based page index, `None` when the plan has no such page.
    #[must_use]
    pub fn locator(&self, page_index: u32) -> Option<String> {
        match self {
            Self::Search {
                base_url,
                query,
                filters,
            } => Some(build_search_url(
                base_url,
                query,
                filters.as_ref(),
                page_index,
            )),
            Self::Single(locator) => (page_index == 1).then(|| locator.clone()),
        }
    }
}

/// Everything a run needs besides the credential.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Record variant extracted
    pub kind: RecordKind,
    /// Page source
    pub locators: LocatorPlan,
    /// Maximum number of pages fetched
    pub page_ceiling: u32,
    /// Overall budget for the run, authentication included
    pub timeout: Duration,
}

impl RunPlan {
    /// People search over up to `page_ceiling` pages.
    #[must_use]
    pub fn search(
        base_url: impl Into<String>,
        query: Query,
        filters: Option<FilterSet>,
        page_ceiling: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            kind: RecordKind::Profile,
            locators: LocatorPlan::Search {
                base_url: base_url.into(),
                query,
                filters,
            },
            page_ceiling,
            timeout,
        }
    }

    /// Comment thread of a single post.
    #[must_use]
    pub fn comments(post_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kind: RecordKind::Comment,
            locators: LocatorPlan::Single(post_url.into()),
            page_ceiling: 1,
            timeout,
        }
    }
}

/// States of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Nothing done yet
    Start,
    /// Establishing the session
    Authenticating,
    /// About to fetch a page
    FetchingPage {
        /// 1-based page index
        page: u32,
    },
    /// Parsing a fetched page
    Extracting {
        /// 1-based page index
        page: u32,
    },
    /// Finished normally
    Done,
    /// Terminated by a failure
    Aborted,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Pagination ended normally; zero records is still a completion
    Completed,
    /// The session could not be established; no page was fetched
    AuthFailed {
        /// Failure description
        reason: String,
    },
    /// A page fetch failed fatally
    Aborted {
        /// Failure description
        cause: String,
    },
    /// The overall budget expired
    TimedOut,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Terminal status
    pub status: RunStatus,
    /// Unique records in discovery order. Empty on timeout.
    pub records: Vec<RawRecord>,
    /// Pages that loaded
    pub pages_fetched: u32,
    /// Elements dropped for missing identity fields
    pub dropped: usize,
}

impl RunReport {
    fn empty(status: RunStatus) -> Self {
        Self {
            status,
            records: Vec::new(),
            pages_fetched: 0,
            dropped: 0,
        }
    }
}

#[derive(Default)]
struct RunProgress {
    records: Vec<RawRecord>,
    dedup: Deduplicator,
    pages_fetched: u32,
    dropped: usize,
    abort_cause: Option<String>,
}

/// Drives session, fetcher and extractor through one run at a time.
///
/// Runs are sequential within a controller call; concurrent calls each own
/// their own session.
pub struct PaginationController<M, F> {
    sessions: M,
    fetcher: F,
    extractor: RecordExtractor,
    page_delay: DelayPolicy,
}

impl<M, F> PaginationController<M, F>
where
    M: SessionManager,
    F: PageFetcher<M::Session>,
{
    /// Create a controller.
    #[must_use]
    pub fn new(sessions: M, fetcher: F, extractor: RecordExtractor, page_delay: DelayPolicy) -> Self {
        Self {
            sessions,
            fetcher,
            extractor,
            page_delay,
        }
    }

    /// Execute one run.
    ///
    /// Authentication failure, fatal fetches and timeouts are reported in the
    /// returned status; records gathered before a fatal fetch are kept.
    pub async fn run(&self, plan: &RunPlan, token: &CredentialToken) -> RunReport {
        let deadline = Instant::now() + plan.timeout;
        tracing::debug!("Run state: {:?}", RunState::Authenticating);

        let session = match timeout_at(deadline, self.sessions.establish(token)).await {
            Ok(Ok(session)) => session,
            Ok(Err(failure)) => {
                tracing::error!("Authentication failed: {}", failure);
                return RunReport::empty(RunStatus::AuthFailed {
                    reason: failure.to_string(),
                });
            }
            Err(_) => {
                tracing::error!("Run timed out after {:?} while authenticating", plan.timeout);
                return RunReport::empty(RunStatus::TimedOut);
            }
        };

        let mut progress = RunProgress::default();
        let result = timeout_at(deadline, self.paginate(&session, plan, &mut progress)).await;
        session.release().await;

        let Ok(terminal) = result else {
            tracing::error!(
                "Run timed out after {:?}; discarding {} records",
                plan.timeout,
                progress.records.len()
            );
            return RunReport::empty(RunStatus::TimedOut);
        };

        let status = match (terminal, progress.abort_cause.take()) {
            (RunState::Aborted, cause) => RunStatus::Aborted {
                cause: cause.unwrap_or_default(),
            },
            _ => RunStatus::Completed,
        };
        tracing::info!(
            "Run finished: {:?}, {} records from {} pages",
            status,
            progress.records.len(),
            progress.pages_fetched
        );

        RunReport {
            status,
            records: progress.records,
            pages_fetched: progress.pages_fetched,
            dropped: progress.dropped,
        }
    }

    async fn paginate(
        &self,
        session: &M::Session,
        plan: &RunPlan,
        progress: &mut RunProgress,
    ) -> RunState {
        let mut state = RunState::FetchingPage { page: 1 };
        let mut content = String::new();

        loop {
            tracing::debug!("Run state: {:?}", state);
            state = match state {
                RunState::FetchingPage { page } if page > plan.page_ceiling => {
                    tracing::info!("Reached page ceiling of {}", plan.page_ceiling);
                    RunState::Done
                }
                RunState::FetchingPage { page } => {
                    let Some(locator) = plan.locators.locator(page) else {
                        break RunState::Done;
                    };
                    let request = PageRequest {
                        locator,
                        kind: plan.kind,
                        page_index: page,
                    };
                    match self.fetcher.fetch(session, &request).await {
                        PageOutcome::Loaded(html) => {
                            progress.pages_fetched += 1;
                            content = html;
                            RunState::Extracting { page }
                        }
                        PageOutcome::Empty => {
                            tracing::info!("Page {} is empty; no more results", page);
                            RunState::Done
                        }
                        PageOutcome::Timeout => {
                            tracing::info!("Page {} timed out; treating as end of results", page);
                            RunState::Done
                        }
                        PageOutcome::Fatal(cause) => {
                            tracing::error!("Fatal fetch failure on page {}: {}", page, cause);
                            progress.abort_cause = Some(cause);
                            RunState::Aborted
                        }
                    }
                }
                RunState::Extracting { page } => {
                    let extraction = self.extractor.extract(plan.kind, &std::mem::take(&mut content));
                    progress.dropped += extraction.dropped;

                    if extraction.elements_seen == 0 {
                        tracing::info!("Page {} has no result elements", page);
                        RunState::Done
                    } else {
                        let fresh = progress.dedup.retain(extraction.records);
                        tracing::info!("Page {}: {} new records", page, fresh.len());
                        progress.records.extend(fresh);

                        let next = page + 1;
                        if next <= plan.page_ceiling {
                            self.page_delay.pause().await;
                        }
                        RunState::FetchingPage { page: next }
                    }
                }
                terminal @ (RunState::Done | RunState::Aborted) => break terminal,
                RunState::Start | RunState::Authenticating => RunState::FetchingPage { page: 1 },
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_core::QueryField;

    #[test]
    fn test_search_plan_locators() {
        let plan = RunPlan::search(
            "https://www.linkedin.com/search/results/people/",
            Query::new().with(QueryField::Title, "CTO"),
            None,
            3,
            Duration::from_secs(300),
        );

        assert_eq!(plan.kind, RecordKind::Profile);
        assert_eq!(
            plan.locators.locator(1).as_deref(),
            Some("https://www.linkedin.com/search/results/people/?title=CTO")
        );
        assert_eq!(
            plan.locators.locator(3).as_deref(),
            Some("https://www.linkedin.com/search/results/people/?title=CTO&page=3")
        );
    }

    #[test]
    fn test_comment_plan_has_one_page() {
        let plan = RunPlan::comments(
            "https://www.linkedin.com/posts/ada_activity-1",
            Duration::from_secs(420),
        );

        assert_eq!(plan.kind, RecordKind::Comment);
        assert_eq!(plan.page_ceiling, 1);
        assert!(plan.locators.locator(1).is_some());
        assert!(plan.locators.locator(2).is_none());
    }
}
