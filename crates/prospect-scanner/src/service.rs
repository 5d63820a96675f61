//! Request-level orchestration.
//!
//! Validates inbound requests, drives one pagination run per request, then
//! post-processes, annotates, stores and optionally exports the records
//! before mapping the run outcome to a response.

use crate::compliance::annotate;
use crate::delay::DelayPolicy;
use crate::error::Result;
use crate::export::{CsvExporter, RecordExporter};
use crate::fetcher::PageFetcher;
use crate::filter::post_process;
use crate::orchestrator::{PaginationController, RunPlan, RunReport, RunStatus};
use crate::parser::RecordExtractor;
use crate::sink::RecordSink;
use prospect_browser::SessionManager;
use prospect_core::{
    AppConfig, ComplianceRecord, CredentialToken, FilterSet, Query, RecordKind, ScrapingConfig,
    ServiceConfig, Timestamp,
};
use prospect_llm::QueryTranslator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A query given either as free text or already structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryInput {
    /// Natural-language text, translated before the run
    Text(String),
    /// Structured query used as is
    Structured(Query),
}

/// People-search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub query: Option<QueryInput>,
    pub filters: Option<FilterSet>,
    pub credential_token: Option<String>,
    pub export_requested: bool,
}

/// Comment-thread request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentsRequest {
    pub post_url: Option<String>,
    pub credential_token: Option<String>,
    pub export_requested: bool,
}

/// Response severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Records were found
    Success,
    /// The run completed without records
    Warning,
    /// The request was rejected or the run failed
    Error,
}

/// Outbound result of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub record_count: usize,
    pub records: Vec<ComplianceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiled_query_echo: Option<Query>,
    /// Post locator, echoed on comment runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
}

impl ExtractionResponse {
    /// Rejection or failure with no records.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            record_count: 0,
            records: Vec::new(),
            compiled_query_echo: None,
            url: None,
            export_path: None,
        }
    }
}

/// Runs extraction requests end to end.
pub struct ExtractionService<M, F> {
    controller: PaginationController<M, F>,
    translator: Arc<dyn QueryTranslator>,
    sink: Option<Arc<dyn RecordSink>>,
    exporter: Option<Arc<dyn RecordExporter>>,
    scraping: ScrapingConfig,
    service: ServiceConfig,
}

impl<M, F> ExtractionService<M, F>
where
    M: SessionManager,
    F: PageFetcher<M::Session>,
{
    /// Build a service from configuration.
    ///
    /// Exports go to a [`CsvExporter`] in the configured export directory; no
    /// sink is attached until [`Self::with_sink`] is called.
    pub fn new(
        config: &AppConfig,
        sessions: M,
        fetcher: F,
        translator: Arc<dyn QueryTranslator>,
    ) -> Result<Self> {
        let extractor = RecordExtractor::new(&config.selectors, &config.session.home_url)?;
        let page_delay = DelayPolicy::from_millis(
            config.scraping.page_delay_min_ms,
            config.scraping.page_delay_max_ms,
        );
        Ok(Self {
            controller: PaginationController::new(sessions, fetcher, extractor, page_delay),
            translator,
            sink: None,
            exporter: Some(Arc::new(CsvExporter::new(config.service.export_dir.clone()))),
            scraping: config.scraping.clone(),
            service: config.service.clone(),
        })
    }

    /// Append every run's records to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the exporter used for `exportRequested`.
    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn RecordExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Run a people search.
    pub async fn search(&self, request: SearchRequest) -> ExtractionResponse {
        let query_input = match request.query {
            Some(QueryInput::Text(text)) if text.trim().is_empty() => None,
            other => other,
        };
        let Some(query_input) = query_input else {
            return ExtractionResponse::error("Query is required");
        };
        let Some(token) = parse_token(request.credential_token) else {
            return ExtractionResponse::error("LinkedIn credential token is required");
        };

        let query = match query_input {
            QueryInput::Text(text) => self.translator.translate(&text).await,
            QueryInput::Structured(query) => query,
        };
        tracing::info!("Compiled query: {:?}", query);

        let plan = RunPlan::search(
            self.scraping.search_base_url.clone(),
            query.clone(),
            request.filters.clone(),
            self.scraping.page_ceiling,
            Duration::from_secs(self.service.search_timeout_secs),
        );
        let report = self.controller.run(&plan, &token).await;

        let mut response = self
            .finish(RecordKind::Profile, report, request.filters.as_ref(), request.export_requested)
            .await;
        response.compiled_query_echo = Some(query);
        response
    }

    /// Extract the comment thread of one post.
    pub async fn comments(&self, request: CommentsRequest) -> ExtractionResponse {
        let (Some(post_url), Some(token)) = (
            request.post_url.filter(|url| !url.trim().is_empty()),
            parse_token(request.credential_token),
        ) else {
            return ExtractionResponse::error("URL and credential token are required");
        };
        if !post_url.starts_with(&self.scraping.allowed_post_prefix) {
            let mut response = ExtractionResponse::error("Please provide a valid LinkedIn URL");
            response.url = Some(post_url);
            return response;
        }

        let plan = RunPlan::comments(
            post_url.clone(),
            Duration::from_secs(self.service.comments_timeout_secs),
        );
        let report = self.controller.run(&plan, &token).await;

        let mut response = self
            .finish(RecordKind::Comment, report, None, request.export_requested)
            .await;
        response.url = Some(post_url);
        response
    }

    async fn finish(
        &self,
        kind: RecordKind,
        report: RunReport,
        filters: Option<&FilterSet>,
        export_requested: bool,
    ) -> ExtractionResponse {
        let records = annotate(post_process(report.records, filters), Timestamp::now());
        let status = status_for(&report.status, records.len());
        let message = message_for(kind, &report.status, records.len());

        if records.is_empty() {
            return ExtractionResponse {
                status,
                message,
                ..ExtractionResponse::error(String::new())
            };
        }

        if let Some(sink) = &self.sink {
            let run_id = uuid::Uuid::new_v4().to_string();
            if let Err(e) = sink.append(&run_id, &records).await {
                tracing::error!("Failed to store records for run {}: {}", run_id, e);
            }
        }

        let export_path = match (&self.exporter, export_requested) {
            (Some(exporter), true) => match exporter.export(kind, &records) {
                Ok(path) => Some(path.display().to_string()),
                Err(e) => {
                    tracing::error!("Failed to export {}: {}", kind, e);
                    None
                }
            },
            _ => None,
        };

        ExtractionResponse {
            status,
            message,
            record_count: records.len(),
            records,
            compiled_query_echo: None,
            url: None,
            export_path,
        }
    }
}

fn parse_token(token: Option<String>) -> Option<CredentialToken> {
    token.and_then(|token| CredentialToken::new(token).ok())
}

fn status_for(status: &RunStatus, record_count: usize) -> ResponseStatus {
    match status {
        RunStatus::Completed if record_count > 0 => ResponseStatus::Success,
        RunStatus::Completed => ResponseStatus::Warning,
        RunStatus::Aborted { .. } | RunStatus::AuthFailed { .. } | RunStatus::TimedOut => {
            ResponseStatus::Error
        }
    }
}

fn message_for(kind: RecordKind, status: &RunStatus, record_count: usize) -> String {
    match status {
        RunStatus::Completed if record_count > 0 => format!("Successfully retrieved {kind}"),
        RunStatus::Completed => match kind {
            RecordKind::Profile => "No profiles found matching your criteria".to_string(),
            RecordKind::Comment => "No comments found for this post".to_string(),
        },
        RunStatus::AuthFailed { .. } => "Failed to authenticate with LinkedIn".to_string(),
        RunStatus::Aborted { cause } => {
            format!("An error occurred while retrieving {kind}: {cause}")
        }
        RunStatus::TimedOut => "The request took too long to complete".to_string(),
    }
}
