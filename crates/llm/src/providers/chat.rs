//! Wire types shared by OpenAI-compatible chat completion APIs.
//!
//! OpenAI and Together.ai accept the same request body. Auth headers, default
//! sampling settings and error reporting differ and live in each provider.

use crate::client::{ChatMessage, LlmRequest, LlmResponse, LlmUsage};
use serde::{Deserialize, Serialize};
use veriqa_core::{AppError, AppResult};

/// `POST /chat/completions` request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn from_request(request: &LlmRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: request.messages(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// `POST /chat/completions` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Take the first choice's content.
    ///
    /// A response without choices or without content is malformed.
    pub fn into_llm_response(
        self,
        provider: &str,
        requested_model: &str,
    ) -> AppResult<LlmResponse> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            AppError::Llm(format!("{} returned a response with no choices", provider))
        })?;

        let content = choice.message.content.ok_or_else(|| {
            AppError::Llm(format!("{} returned a choice with no message content", provider))
        })?;

        let usage = self
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}
