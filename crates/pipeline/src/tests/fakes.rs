//! In-process stand-ins for the external services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use veriqa_core::{AppError, AppResult};
use veriqa_detect::{
    HallucinationClassifier, HallucinationLabel, HallucinationSpan, SpanDetector, SpanLocalizer,
    Verdict,
};
use veriqa_knowledge::{Context, StaticRetriever};
use veriqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, ProviderType};
use veriqa_prompt::{builtin_prompt, ANSWER_PROMPT_ID};

use crate::orchestrator::Pipeline;
use crate::provider::AnswerProvider;
use crate::types::ProviderPair;

/// LLM that returns a fixed reply (or error) after an optional delay.
pub struct ScriptedLlm {
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn reply(text: &str) -> Self {
        Self::with_result(Ok(text.to_string()))
    }

    pub fn fail(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(reply: Result<String, String>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
                finish_reason: Some("stop".to_string()),
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }
}

/// Labels text mentioning "Paris" as supported, anything else as hallucinated.
/// Scores are hallucination probabilities.
#[derive(Default)]
pub struct KeywordClassifier {
    seen: Mutex<Vec<String>>,
}

impl KeywordClassifier {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HallucinationClassifier for KeywordClassifier {
    fn backend_name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> AppResult<HallucinationLabel> {
        self.seen.lock().unwrap().push(text.to_string());
        if text.contains("Paris") {
            Ok(HallucinationLabel::new(Verdict::Supported, 0.012345))
        } else {
            Ok(HallucinationLabel::new(Verdict::Hallucinated, 0.91234))
        }
    }
}

/// Never answers within any reasonable deadline.
pub struct StalledClassifier;

#[async_trait::async_trait]
impl HallucinationClassifier for StalledClassifier {
    fn backend_name(&self) -> &str {
        "stalled"
    }

    async fn classify(&self, _text: &str) -> AppResult<HallucinationLabel> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(HallucinationLabel::new(Verdict::Supported, 0.0))
    }
}

pub struct FailingClassifier;

#[async_trait::async_trait]
impl HallucinationClassifier for FailingClassifier {
    fn backend_name(&self) -> &str {
        "failing"
    }

    async fn classify(&self, _text: &str) -> AppResult<HallucinationLabel> {
        Err(AppError::Detection("model is loading".to_string()))
    }
}

/// Flags every occurrence of "Lyon" in the answer.
#[derive(Default)]
pub struct LyonSpanDetector {
    calls: AtomicUsize,
}

impl LyonSpanDetector {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpanDetector for LyonSpanDetector {
    fn backend_name(&self) -> &str {
        "lyon"
    }

    async fn predict(
        &self,
        _context: &str,
        _question: &str,
        answer: &str,
    ) -> AppResult<Vec<HallucinationSpan>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(answer
            .match_indices("Lyon")
            .map(|(start, text)| HallucinationSpan {
                start,
                end: start + text.len(),
                text: text.to_string(),
                confidence: Some(0.8),
            })
            .collect())
    }
}

pub struct FailingSpanDetector;

#[async_trait::async_trait]
impl SpanDetector for FailingSpanDetector {
    fn backend_name(&self) -> &str {
        "failing"
    }

    async fn predict(
        &self,
        _context: &str,
        _question: &str,
        _answer: &str,
    ) -> AppResult<Vec<HallucinationSpan>> {
        Err(AppError::Detection("connection refused".to_string()))
    }
}

pub fn paris_context() -> Context {
    Context::article("Paris", "Paris is the capital and largest city of France.")
}

/// Pipeline wired entirely to fakes.
pub fn fake_pipeline(
    context: Context,
    openai: Arc<ScriptedLlm>,
    together: Arc<ScriptedLlm>,
    classifier: Arc<dyn HallucinationClassifier>,
    detector: Arc<dyn SpanDetector>,
) -> Pipeline {
    Pipeline::new(
        Arc::new(StaticRetriever::new(context)),
        ProviderPair::new(
            AnswerProvider::new(ProviderType::OpenAI, openai, "gpt-3.5-turbo"),
            AnswerProvider::new(ProviderType::Together, together, "meta-llama/Llama-Vision-Free"),
        ),
        classifier,
        SpanLocalizer::new(detector),
        builtin_prompt(ANSWER_PROMPT_ID).unwrap(),
    )
}
