//! Scripted session manager and page fetcher shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use prospect_browser::{AuthFailure, Session, SessionManager};
use prospect_core::CredentialToken;
use prospect_scanner::{PageFetcher, PageOutcome, PageRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REJECTED_TOKEN: &str = "bad-token";

/// Shared observation points for one test.
#[derive(Clone, Default)]
pub struct Counters {
    pub established: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl Counters {
    pub fn established(&self) -> usize {
        self.established.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub struct FakeSession {
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl Session for FakeSession {
    async fn release(self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Accepts every token except [`REJECTED_TOKEN`], optionally after a delay.
pub struct FakeSessions {
    counters: Counters,
    auth_delay: Duration,
}

impl FakeSessions {
    pub fn new(counters: &Counters) -> Self {
        Self {
            counters: counters.clone(),
            auth_delay: Duration::ZERO,
        }
    }

    pub fn with_auth_delay(mut self, delay: Duration) -> Self {
        self.auth_delay = delay;
        self
    }
}

#[async_trait]
impl SessionManager for FakeSessions {
    type Session = FakeSession;

    async fn establish(&self, token: &CredentialToken) -> Result<FakeSession, AuthFailure> {
        if !self.auth_delay.is_zero() {
            tokio::time::sleep(self.auth_delay).await;
        }
        if token.expose() == REJECTED_TOKEN {
            return Err(AuthFailure::LandmarkMissing {
                selector: ".global-nav__primary-link".to_string(),
                waited_secs: 30,
            });
        }
        self.counters.established.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            released: self.counters.released.clone(),
        })
    }
}

/// Plays back outcomes in order, then repeats `fallback` forever.
pub struct ScriptedFetcher {
    counters: Counters,
    script: Mutex<VecDeque<PageOutcome>>,
    fallback: PageOutcome,
    latency: Duration,
}

impl ScriptedFetcher {
    pub fn new(counters: &Counters, script: Vec<PageOutcome>) -> Self {
        Self {
            counters: counters.clone(),
            script: Mutex::new(script.into()),
            fallback: PageOutcome::Empty,
            latency: Duration::ZERO,
        }
    }

    pub fn with_fallback(mut self, fallback: PageOutcome) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PageFetcher<FakeSession> for ScriptedFetcher {
    async fn fetch(&self, _session: &FakeSession, request: &PageRequest) -> PageOutcome {
        self.counters.requests.lock().unwrap().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// A people-search page with one result per `(name, slug)`.
pub fn profile_page(people: &[(&str, &str)]) -> PageOutcome {
    let items: String = people
        .iter()
        .map(|(name, slug)| {
            format!(
                r#"<li class="reusable-search__result-container">
                    <a class="app-aware-link" href="/in/{slug}"><span class="actor-name">{name}</span></a>
                    <div class="subline-level-1">Engineer</div>
                    <div class="subline-level-2">Berlin</div>
                </li>"#
            )
        })
        .collect();
    PageOutcome::Loaded(format!("<html><body><ul>{items}</ul></body></html>"))
}

/// A post page with one comment per `(name, text)`.
pub fn comment_page(comments: &[(&str, &str)]) -> PageOutcome {
    let items: String = comments
        .iter()
        .map(|(name, text)| {
            format!(
                r#"<article class="comments-comment-item">
                    <span class="comments-post-meta__name-text">{name}</span>
                    <div class="comments-comment-item__main-content">{text}</div>
                    <span class="comments-comment-social-bar__social-counts">3</span>
                </article>"#
            )
        })
        .collect();
    PageOutcome::Loaded(format!("<html><body>{items}</body></html>"))
}
