//! Together.ai chat completion provider.
//!
//! API: https://docs.together.ai/reference/chat-completions

use super::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::types::ProviderType;
use veriqa_core::{AppError, AppResult};

/// Sampling temperature used when the request does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Completion cap used when the request does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Together.ai LLM client.
pub struct TogetherClient {
    /// Base URL for the API (without `/chat/completions`)
    base_url: String,

    /// Bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl TogetherClient {
    /// Create a client against the public Together.ai API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(ProviderType::Together.default_endpoint(), api_key)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert LlmRequest to Together's body, filling the sampling defaults.
    fn to_together_request(&self, request: &LlmRequest) -> ChatCompletionRequest {
        let mut body = ChatCompletionRequest::from_request(request);
        body.temperature = Some(request.temperature.unwrap_or(DEFAULT_TEMPERATURE));
        body.max_tokens = Some(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS));
        body
    }
}

#[async_trait::async_trait]
impl LlmClient for TogetherClient {
    fn provider_name(&self) -> &str {
        ProviderType::Together.as_str()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Together.ai");
        tracing::debug!("Request: {:?}", request);

        let body = self.to_together_request(request);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Together.ai: {}", e)))?;

        // Together reports failures as "<status code> <raw body>"
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "{} {}",
                status.as_u16(),
                error_text
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse Together.ai response: {}", e))
        })?;

        let llm_response = parsed.into_llm_response("Together.ai", &request.model)?;

        tracing::info!("Received completion from Together.ai");
        Ok(llm_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriqa_core::testing::{CannedServer, RecordedRequest};

    #[test]
    fn test_together_client_creation() {
        let client = TogetherClient::new("key");
        assert_eq!(client.provider_name(), "together");
        assert_eq!(
            client.completions_url(),
            "https://api.together.xyz/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_defaults_applied() {
        let client = TogetherClient::new("key");
        let request = LlmRequest::new("Hello", "meta-llama/Llama-Vision-Free");

        let body = client.to_together_request(&request);
        assert_eq!(body.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(body.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }

    #[test]
    fn test_request_overrides_kept() {
        let client = TogetherClient::new("key");
        let request = LlmRequest::new("Hello", "m")
            .with_temperature(0.1)
            .with_max_tokens(64);

        let body = client.to_together_request(&request);
        assert_eq!(body.temperature, Some(0.1));
        assert_eq!(body.max_tokens, Some(64));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_error() {
        let client = TogetherClient::with_base_url("http://127.0.0.1:9", "k");
        let result = client.complete(&LlmRequest::new("Hi", "m")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_non_ok_status_reports_code_and_body() {
        let server = CannedServer::start(|_: &RecordedRequest| {
            (401, r#"{"error": "invalid api key"}"#.to_string())
        })
        .await
        .unwrap();
        let client = TogetherClient::with_base_url(server.base_url(), "bad-key");

        match client.complete(&LlmRequest::new("Hi", "m")).await {
            Err(AppError::Llm(msg)) => assert_eq!(msg, r#"401 {"error": "invalid api key"}"#),
            other => panic!("Expected LLM error, got {:?}", other.map(|r| r.content)),
        }
    }

    #[tokio::test]
    async fn test_completion_sends_defaults() {
        let server = CannedServer::start(|_: &RecordedRequest| {
            (
                200,
                r#"{"choices": [{"message": {"content": "Paris is the capital."}}]}"#.to_string(),
            )
        })
        .await
        .unwrap();
        let client = TogetherClient::with_base_url(server.base_url(), "tg-key");

        let response = client
            .complete(&LlmRequest::new("Capital of France?", "meta-llama/Llama-Vision-Free"))
            .await
            .unwrap();
        assert_eq!(response.content, "Paris is the capital.");

        let requests = server.requests();
        assert_eq!(requests[0].path(), "/chat/completions");
        assert_eq!(requests[0].header("authorization"), Some("bearer tg-key"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["model"], "meta-llama/Llama-Vision-Free");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["messages"][0]["content"], "Capital of France?");
    }
}
