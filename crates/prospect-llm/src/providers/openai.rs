//! `OpenAI`-compatible chat completions provider.

use super::common::{build_http_client, convert_role_standard, StandardMessage, StandardUsage};
use crate::error::{LlmError, Result};
use crate::provider::{CompletionRequest, CompletionResponse, LlmProvider, Usage};
use async_trait::async_trait;
use prospect_core::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Provider for `OpenAI`'s chat completions API and compatible servers.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a provider for a specific model on the public API.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            client: build_http_client(Some(60))?,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    /// Create a provider from configuration.
    ///
    /// # Errors
    /// Returns `LlmError::InvalidRequest` if no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidRequest("missing API key".to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            client: build_http_client(Some(config.timeout_secs))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Point the provider at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert internal request to `OpenAI` API format.
    fn to_api_request(&self, request: &CompletionRequest) -> OpenAiRequest {
        let mut messages: Vec<StandardMessage> = Vec::new();

        if let Some(system) = &request.system_prompt {
            messages.push(StandardMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        for message in &request.messages {
            messages.push(StandardMessage {
                role: convert_role_standard(message.role),
                content: message.content.clone(),
            });
        }

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Convert `OpenAI` API response to internal format.
    fn convert_api_response(response: OpenAiResponse) -> Result<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError {
                provider: "openai".to_string(),
                message: "no choices in response".to_string(),
            })?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: response.model,
            stop_reason: choice.finish_reason,
            usage: response.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError {
                provider: "openai".to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        let api_response: OpenAiResponse =
            response.json().await.map_err(|e| LlmError::ParseError {
                provider: "openai".to_string(),
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::convert_api_response(api_response)
    }

    fn provider_id(&self) -> &'static str {
        "openai"
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<StandardMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<StandardUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: StandardMessage,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_with_custom_model() {
        let provider =
            OpenAiProvider::with_model("test-key", "gpt-3.5-turbo").expect("create provider");
        assert_eq!(provider.provider_id(), "openai");
        assert_eq!(provider.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            OpenAiProvider::from_config(&config),
            Err(LlmError::InvalidRequest(_))
        ));

        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:1234/v1/".to_string(),
            ..LlmConfig::default()
        };
        let provider = OpenAiProvider::from_config(&config).expect("create provider");
        assert_eq!(provider.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_api_request_conversion() {
        let provider =
            OpenAiProvider::with_model("test-key", "gpt-3.5-turbo").expect("create provider");
        let request = CompletionRequest::new("Hello")
            .with_max_tokens(150)
            .with_temperature(0.3)
            .with_system_prompt("You are helpful");

        let api_request = provider.to_api_request(&request);

        assert_eq!(api_request.model, "gpt-3.5-turbo");
        assert_eq!(api_request.max_tokens, Some(150));
        assert_eq!(api_request.messages.len(), 2);
        assert_eq!(api_request.messages[0].role, "system");
        assert_eq!(api_request.messages[1].role, "user");
        assert_eq!(api_request.messages[1].content, "Hello");
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"model":"gpt-3.5-turbo","choices":[{"message":{"role":"assistant","content":"{\"title\":\"CTO\"}"},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":5}}"#,
            )
            .create_async()
            .await;

        let provider = OpenAiProvider::with_model("test-key", "gpt-3.5-turbo")
            .expect("create provider")
            .with_base_url(server.url());
        let response = provider
            .complete(CompletionRequest::new("Find CTOs"))
            .await
            .expect("complete");

        assert_eq!(response.content, r#"{"title":"CTO"}"#);
        assert_eq!(response.usage.map(|u| u.total_tokens()), Some(17));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid key")
            .create_async()
            .await;

        let provider = OpenAiProvider::with_model("bad-key", "gpt-3.5-turbo")
            .expect("create provider")
            .with_base_url(server.url());
        let err = provider
            .complete(CompletionRequest::new("Find CTOs"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, LlmError::ApiError { status: 401, .. }));
    }
}
