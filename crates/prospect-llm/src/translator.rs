//! Free-text to structured query translation.
//!
//! Translation never fails from the caller's point of view: any provider or
//! parse failure degrades to a blank [`Query`], which compiles to the bare
//! search locator.

use crate::error::Result;
use crate::provider::{CompletionRequest, LlmProvider};
use crate::providers::OpenAiProvider;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use prospect_core::{LlmConfig, Query, QueryField};
use regex::Regex;
use std::str::FromStr;
use std::sync::Arc;

/// Instructions sent with every translation request.
pub const SYSTEM_PROMPT: &str = r#"Convert natural language queries into LinkedIn search parameters. Format the output as a dictionary with these possible keys:
- keywords: Main search terms
- title: Job titles or positions
- company: Company names
- location: Geographic locations
- industry: Industry sectors
- filters: Additional filters like company size, connections, etc.

Example:
Input: "Find marketing directors in California working at tech startups"
Output: {
    "title": "Marketing Director",
    "location": "California",
    "industry": "Technology",
    "company": "",
    "filters": "company size: 1-200"
}"#;

// Keys the model may emit. `filters` is matched only to delimit values.
static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)["']?\b(keywords|title|company|location|industry|filters)\b["']?\s*:"#)
        .expect("valid key pattern regex")
});

/// Turns free text into a structured [`Query`].
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    /// Translate `text`. Returns a possibly blank query, never an error.
    async fn translate(&self, text: &str) -> Query;
}

/// Uses the whole trimmed text as the `keywords` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTranslator;

#[async_trait]
impl QueryTranslator for KeywordTranslator {
    async fn translate(&self, text: &str) -> Query {
        let text = text.trim();
        if text.is_empty() {
            Query::new()
        } else {
            Query::new().with(QueryField::Keywords, text)
        }
    }
}

/// Asks a chat-completion model to extract the query fields.
pub struct LlmQueryTranslator {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmQueryTranslator {
    /// Create a translator over `provider` with the default sampling settings.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            provider,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Create a translator talking to the configured `OpenAI`-compatible endpoint.
    ///
    /// # Errors
    /// Returns error if no API key is configured or the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = OpenAiProvider::from_config(config)?;
        Ok(Self {
            provider: Arc::new(provider),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl QueryTranslator for LlmQueryTranslator {
    async fn translate(&self, text: &str) -> Query {
        let text = text.trim();
        if text.is_empty() {
            return Query::new();
        }

        let request = CompletionRequest::new(text)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        match self.provider.complete(request).await {
            Ok(response) => {
                let query = parse_query_output(&response.content);
                if query.is_blank() {
                    tracing::warn!(
                        "Translator output had no usable fields: {:?}",
                        response.content
                    );
                } else {
                    tracing::debug!("Translated query: {:?}", query);
                }
                query
            }
            Err(e) => {
                tracing::error!(
                    "Query translation via {} failed: {}",
                    self.provider.provider_id(),
                    e
                );
                Query::new()
            }
        }
    }
}

/// Pick the translator the configuration asks for.
///
/// Falls back to [`KeywordTranslator`] when the LLM is disabled or cannot be set up.
#[must_use]
pub fn translator_from_config(config: &LlmConfig) -> Arc<dyn QueryTranslator> {
    if !config.enabled {
        return Arc::new(KeywordTranslator);
    }
    match LlmQueryTranslator::from_config(config) {
        Ok(translator) => Arc::new(translator),
        Err(e) => {
            tracing::warn!("LLM translation disabled: {}", e);
            Arc::new(KeywordTranslator)
        }
    }
}

/// Parse model output into a [`Query`].
///
/// Accepts a JSON object (optionally inside a code fence or surrounding prose),
/// a Python-style dict, or `key: value` lines. Unknown keys and `filters` are
/// ignored; unreadable output yields a blank query.
#[must_use]
pub fn parse_query_output(output: &str) -> Query {
    parse_json_object(output).unwrap_or_else(|| parse_key_values(output))
}

fn parse_json_object(output: &str) -> Option<Query> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end < start {
        return None;
    }
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&output[start..=end]).ok()?;

    let mut query = Query::new();
    for (key, value) in object {
        let Ok(field) = QueryField::from_str(&key) else {
            continue;
        };
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => continue,
        };
        let text = text.trim();
        if !text.is_empty() {
            query.set(field, text);
        }
    }
    Some(query)
}

fn parse_key_values(output: &str) -> Query {
    let mut query = Query::new();
    let keys: Vec<_> = KEY_PATTERN.captures_iter(output).collect();
    for (i, caps) in keys.iter().enumerate() {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value_end = keys
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(output.len(), |m| m.start());
        let value = output[whole.end()..value_end]
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '{' | '}' | '"' | '\''));

        if let Ok(field) = QueryField::from_str(key.as_str()) {
            if !value.is_empty() {
                query.set(field, value);
            }
        }
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::provider::CompletionResponse;

    struct ScriptedProvider(std::result::Result<String, String>);

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            match &self.0 {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    model: "scripted".to_string(),
                    stop_reason: None,
                    usage: None,
                }),
                Err(message) => Err(LlmError::Internal(message.clone())),
            }
        }

        fn provider_id(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_parse_json_output() {
        let query = parse_query_output(
            r#"{"title": "Marketing Director", "location": "California", "industry": "Technology", "company": "", "filters": "company size: 1-200"}"#,
        );
        assert_eq!(query.value(QueryField::Title), Some("Marketing Director"));
        assert_eq!(query.value(QueryField::Location), Some("California"));
        assert_eq!(query.value(QueryField::Industry), Some("Technology"));
        assert_eq!(query.value(QueryField::Company), None);
        assert_eq!(query.value(QueryField::Keywords), None);
    }

    #[test]
    fn test_parse_fenced_json() {
        let output = "Here you go:\n```json\n{\"keywords\": \"rust\", \"location\": \"Berlin\"}\n```";
        let query = parse_query_output(output);
        assert_eq!(query.value(QueryField::Keywords), Some("rust"));
        assert_eq!(query.value(QueryField::Location), Some("Berlin"));
    }

    #[test]
    fn test_parse_python_dict() {
        let query =
            parse_query_output("{'title': 'Software Engineer', 'location': 'San Francisco, CA'}");
        assert_eq!(query.value(QueryField::Title), Some("Software Engineer"));
        assert_eq!(query.value(QueryField::Location), Some("San Francisco, CA"));
    }

    #[test]
    fn test_parse_key_value_lines() {
        let query = parse_query_output("Title: CTO\nCompany: Google\nfilters: 500+ connections");
        assert_eq!(query.value(QueryField::Title), Some("CTO"));
        assert_eq!(query.value(QueryField::Company), Some("Google"));
        assert_eq!(query.present_fields().count(), 2);
    }

    #[test]
    fn test_key_pattern_captures_known_keys() {
        let keys: Vec<_> = KEY_PATTERN
            .captures_iter(r#"'title': "CTO", Location: Berlin, salary: 10, filters: none"#)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_lowercase()))
            .collect();
        assert_eq!(keys, vec!["title", "location", "filters"]);
    }

    #[test]
    fn test_parse_garbage_is_blank() {
        assert!(parse_query_output("I cannot help with that.").is_blank());
        assert!(parse_query_output("").is_blank());
    }

    #[tokio::test]
    async fn test_keyword_translator() {
        let query = KeywordTranslator.translate("  data engineers  ").await;
        assert_eq!(query.value(QueryField::Keywords), Some("data engineers"));
        assert!(KeywordTranslator.translate("   ").await.is_blank());
    }

    #[tokio::test]
    async fn test_llm_translator_parses_response() {
        let provider = ScriptedProvider(Ok(r#"{"title": "CTO", "location": "Berlin"}"#.to_string()));
        let translator = LlmQueryTranslator::new(Arc::new(provider));

        let query = translator.translate("CTOs in Berlin").await;
        assert_eq!(query.value(QueryField::Title), Some("CTO"));
        assert_eq!(query.value(QueryField::Location), Some("Berlin"));
    }

    #[tokio::test]
    async fn test_llm_translator_failure_is_blank() {
        let provider = ScriptedProvider(Err("connection refused".to_string()));
        let translator = LlmQueryTranslator::new(Arc::new(provider));

        assert!(translator.translate("CTOs in Berlin").await.is_blank());
    }

    #[tokio::test]
    async fn test_disabled_config_uses_keywords() {
        let translator = translator_from_config(&LlmConfig::default());
        let query = translator.translate("rust developers").await;
        assert_eq!(query.value(QueryField::Keywords), Some("rust developers"));
    }
}
