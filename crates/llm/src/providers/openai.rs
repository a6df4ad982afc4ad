//! OpenAI chat completion provider.
//!
//! API: https://platform.openai.com/docs/api-reference/chat

use super::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::types::ProviderType;
use serde::Deserialize;
use veriqa_core::{AppError, AppResult};

/// OpenAI error envelope: `{"error": {"message": "...", "type": "..."}}`.
#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// OpenAI LLM client.
pub struct OpenAiClient {
    /// Base URL for the API (without `/chat/completions`)
    base_url: String,

    /// Bearer token
    api_key: String,

    /// Optional `OpenAI-Organization` header value
    organization: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(ProviderType::OpenAI.default_endpoint(), api_key)
    }

    /// Create a client against a custom base URL (proxy, Azure-style gateway).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            organization: None,
            client: reqwest::Client::new(),
        }
    }

    /// Send an `OpenAI-Organization` header with every request.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Turn a non-2xx body into a readable message, preferring OpenAI's error envelope.
    fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<OpenAiErrorEnvelope>(body) {
            Ok(envelope) => match envelope.error.kind {
                Some(kind) => format!(
                    "OpenAI API error ({}): {} [{}]",
                    status, envelope.error.message, kind
                ),
                None => format!("OpenAI API error ({}): {}", status, envelope.error.message),
            },
            Err(_) => format!("OpenAI API error ({}): {}", status, body),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        ProviderType::OpenAI.as_str()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to OpenAI");
        tracing::debug!("Request: {:?}", request);

        let body = ChatCompletionRequest::from_request(request);

        let mut builder = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body);

        if let Some(ref org) = self.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(Self::describe_error(status, &error_text)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let llm_response = parsed.into_llm_response("OpenAI", &request.model)?;

        tracing::info!("Received completion from OpenAI");
        tracing::debug!(
            "Token usage - Prompt: {}, Completion: {}",
            llm_response.usage.prompt_tokens,
            llm_response.usage.completion_tokens
        );

        Ok(llm_response)
    }
}
