//! Query refinement: rewrite a question to be clearer before asking it.

use crate::cancel::CancelToken;
use crate::provider::AnswerProvider;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use veriqa_core::{AppConfig, AppError, AppResult};
use veriqa_llm::ProviderType;
use veriqa_prompt::{build_prompt, load_prompt, PromptDefinition, REFINE_PROMPT_ID};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefinementError {
    #[error("No input provided")]
    EmptyInput,

    #[error("{0}")]
    Backend(String),
}

/// Rewrites a user question with a single LLM call.
#[derive(Debug, Clone)]
pub struct QueryRefiner {
    provider: AnswerProvider,
    prompt: PromptDefinition,
    timeout: Option<Duration>,
}

impl QueryRefiner {
    pub fn new(provider: AnswerProvider, prompt: PromptDefinition) -> Self {
        Self {
            provider,
            prompt,
            timeout: None,
        }
    }

    /// Use the provider named by `pipeline.refinerProvider`.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let id = ProviderType::parse(&config.pipeline.refiner_provider).ok_or_else(|| {
            AppError::Config(format!(
                "Unknown refiner provider: {}",
                config.pipeline.refiner_provider
            ))
        })?;
        let prompt = load_prompt(&config.workspace, REFINE_PROMPT_ID)?;
        let timeout = match config.pipeline.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self::new(AnswerProvider::from_config(config, id), prompt).with_timeout(timeout))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> &AnswerProvider {
        &self.provider
    }

    /// Return an improved version of `question`.
    ///
    /// Blank input is rejected without contacting the backend.
    pub async fn improve_query(&self, question: &str) -> Result<String, RefinementError> {
        if question.trim().is_empty() {
            return Err(RefinementError::EmptyInput);
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        let prompt =
            build_prompt(&self.prompt, vars).map_err(|e| RefinementError::Backend(e.to_string()))?;

        let cancel = match self.timeout {
            Some(timeout) => CancelToken::none().with_timeout(timeout),
            None => CancelToken::none(),
        };

        let answer = cancel
            .guard(self.provider.answer(&prompt))
            .await
            .map_err(|reason| RefinementError::Backend(reason.to_string()))?;

        match answer.result {
            Ok(improved) => {
                info!(provider = self.provider.id().as_str(), "Query refined");
                Ok(improved)
            }
            Err(e) => {
                warn!(provider = self.provider.id().as_str(), "Query refinement failed: {}", e);
                Err(RefinementError::Backend(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::ScriptedLlm;
    use std::sync::Arc;
    use veriqa_prompt::builtin_prompt;

    fn refiner(llm: Arc<ScriptedLlm>) -> QueryRefiner {
        QueryRefiner::new(
            AnswerProvider::new(ProviderType::OpenAI, llm, "gpt-3.5-turbo"),
            builtin_prompt(REFINE_PROMPT_ID).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_backend_call() {
        let llm = Arc::new(ScriptedLlm::reply("unused"));
        let refiner = refiner(llm.clone());

        assert_eq!(refiner.improve_query("").await, Err(RefinementError::EmptyInput));
        assert_eq!(refiner.improve_query("   ").await, Err(RefinementError::EmptyInput));
        assert_eq!(llm.calls(), 0);
        assert_eq!(RefinementError::EmptyInput.to_string(), "No input provided");
    }

    #[tokio::test]
    async fn test_improve_query_returns_backend_text() {
        let llm = Arc::new(ScriptedLlm::reply("What is the capital city of France?"));
        let refiner = refiner(llm.clone());

        let improved = refiner.improve_query("capital france").await.unwrap();
        assert_eq!(improved, "What is the capital city of France?");

        let request = llm.last_request().unwrap();
        assert!(request.prompt.contains("Original query: \"capital france\""));
        assert!(request.system.is_some());
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported() {
        let refiner = refiner(Arc::new(ScriptedLlm::fail("quota exceeded")));
        assert_eq!(
            refiner.improve_query("capital france").await,
            Err(RefinementError::Backend("quota exceeded".to_string()))
        );
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let llm = ScriptedLlm::reply("late").with_delay(Duration::from_secs(30));
        let refiner = refiner(Arc::new(llm)).with_timeout(Some(Duration::from_millis(20)));
        assert_eq!(
            refiner.improve_query("capital france").await,
            Err(RefinementError::Backend("request timed out".to_string()))
        );
    }
}
