//! Answer providers: one chat-completion backend plus its sampling settings.

use crate::types::{ProviderAnswer, ProviderError};
use std::sync::Arc;
use tracing::{debug, warn};
use veriqa_core::config::ProviderConfig;
use veriqa_core::AppConfig;
use veriqa_llm::{create_client, create_openai_client, LlmClient, LlmRequest, ProviderType};
use veriqa_prompt::BuiltPrompt;

/// A named answer backend.
///
/// A provider whose client could not be built (missing key, bad provider
/// name) is still a valid provider: every call fails with
/// [`ProviderError::Unavailable`] inside its own slot.
#[derive(Clone)]
pub struct AnswerProvider {
    id: ProviderType,
    backend: Result<Arc<dyn LlmClient>, String>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AnswerProvider {
    pub fn new(id: ProviderType, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            id,
            backend: Ok(client),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// A provider that fails every call with `reason`.
    pub fn unavailable(
        id: ProviderType,
        reason: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id,
            backend: Err(reason.into()),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Build the provider `id` from configuration, resolving its API key.
    pub fn from_config(config: &AppConfig, id: ProviderType) -> Self {
        let pc = match id {
            ProviderType::OpenAI => &config.providers.openai,
            ProviderType::Together => &config.providers.together,
        };
        let api_key = config.resolve_api_key(id.as_str());

        let client = match id {
            ProviderType::OpenAI => create_openai_client(
                pc.endpoint.as_deref(),
                api_key.as_deref(),
                config.resolve_organization().as_deref(),
            ),
            ProviderType::Together => {
                create_client(id.as_str(), pc.endpoint.as_deref(), api_key.as_deref())
            }
        };

        let provider = match client {
            Ok(client) => Self::new(id, client, &pc.model),
            Err(reason) => {
                let reason = format!("{} (set {})", reason, pc.api_key_env);
                warn!(provider = id.as_str(), "Provider unavailable: {}", reason);
                Self::unavailable(id, reason, &pc.model)
            }
        };
        provider.with_sampling(pc)
    }

    fn with_sampling(mut self, pc: &ProviderConfig) -> Self {
        self.temperature = pc.temperature;
        self.max_tokens = pc.max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn id(&self) -> ProviderType {
        self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_ok()
    }

    fn request(&self, prompt: &BuiltPrompt) -> LlmRequest {
        let mut request = LlmRequest::new(prompt.user.clone(), self.model.clone());
        if let Some(system) = &prompt.system {
            request = request.with_system(system.clone());
        }
        if let Some(t) = self.temperature {
            request = request.with_temperature(t);
        }
        if let Some(n) = self.max_tokens {
            request = request.with_max_tokens(n);
        }
        request
    }

    /// Answer a built prompt (system instruction plus context and question).
    ///
    /// Never fails outward; errors are carried in the returned answer.
    pub async fn answer(&self, prompt: &BuiltPrompt) -> ProviderAnswer {
        let client = match &self.backend {
            Ok(client) => client,
            Err(reason) => {
                return ProviderAnswer::failure(self.id, ProviderError::Unavailable(reason.clone()))
            }
        };

        debug!(provider = self.id.as_str(), model = %self.model, "Calling provider");
        match client.complete(&self.request(prompt)).await {
            Ok(response) => {
                debug!(
                    provider = self.id.as_str(),
                    bytes = response.content.len(),
                    "Provider answered"
                );
                ProviderAnswer::success(self.id, response.content)
            }
            Err(e) => {
                warn!(provider = self.id.as_str(), "Provider call failed: {}", e);
                ProviderAnswer::failure(self.id, e.into())
            }
        }
    }
}

impl std::fmt::Debug for AnswerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerProvider")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("available", &self.backend.is_ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::ScriptedLlm;
    use std::collections::HashMap;

    fn prompt() -> BuiltPrompt {
        BuiltPrompt::new(
            Some("Be brief.".to_string()),
            "Question: hi".to_string(),
            "answer.rag".to_string(),
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn test_answer_success_forwards_settings() {
        let llm = Arc::new(ScriptedLlm::reply("Hello."));
        let provider = AnswerProvider::new(ProviderType::Together, llm.clone(), "llama")
            .with_temperature(0.7)
            .with_max_tokens(512);

        let answer = provider.answer(&prompt()).await;
        assert_eq!(answer.text(), Some("Hello."));

        let request = llm.last_request().unwrap();
        assert_eq!(request.model, "llama");
        assert_eq!(request.system.as_deref(), Some("Be brief."));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_answer_backend_failure() {
        let provider = AnswerProvider::new(
            ProviderType::OpenAI,
            Arc::new(ScriptedLlm::fail("429 rate limited")),
            "gpt",
        );
        let answer = provider.answer(&prompt()).await;
        assert_eq!(answer.display_text(), "Error from OpenAI: 429 rate limited");
    }

    #[tokio::test]
    async fn test_unavailable_provider() {
        let provider = AnswerProvider::unavailable(ProviderType::OpenAI, "no key", "gpt");
        assert!(!provider.is_available());
        let answer = provider.answer(&prompt()).await;
        assert_eq!(
            answer.error(),
            Some(&ProviderError::Unavailable("no key".to_string()))
        );
    }

    #[test]
    fn test_from_config_without_key_is_unavailable() {
        let mut config = AppConfig::default();
        config.providers.together.api_key_env = "VERIQA_TEST_UNSET_TOGETHER_KEY".to_string();
        let provider = AnswerProvider::from_config(&config, ProviderType::Together);
        assert!(!provider.is_available());
        assert_eq!(provider.model(), config.providers.together.model);
    }
}
