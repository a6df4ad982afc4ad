//! Per-query orchestration: context, answers, classification, spans.

use crate::cancel::{CancelToken, Interrupted};
use crate::provider::AnswerProvider;
use crate::stage::{PipelineStage, StageTrace};
use crate::types::{LaneReport, PipelineResult, ProviderAnswer, ProviderError, ProviderPair};
use futures::future::join;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use veriqa_core::{AppConfig, AppResult};
use veriqa_detect::{
    HallucinationClassifier, HallucinationLabel, HallucinationSpan, HttpSpanDetector,
    HuggingFaceClassifier, SpanLocalizer, Verdict,
};
use veriqa_knowledge::{Context, ContextRetriever, WikipediaRetriever};
use veriqa_llm::ProviderType;
use veriqa_prompt::{build_prompt, load_prompt, BuiltPrompt, PromptDefinition, ANSWER_PROMPT_ID};

/// Answers a query with both providers and scores each answer.
///
/// Stages run behind barriers: every answer is collected before any
/// classification starts, and every classification before any span
/// localization. Within a stage the two provider lanes run concurrently and
/// a failure in one lane never affects the other.
pub struct Pipeline {
    retriever: Arc<dyn ContextRetriever>,
    providers: ProviderPair<AnswerProvider>,
    classifier: Arc<dyn HallucinationClassifier>,
    spans: SpanLocalizer,
    answer_prompt: PromptDefinition,
    request_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        providers: ProviderPair<AnswerProvider>,
        classifier: Arc<dyn HallucinationClassifier>,
        spans: SpanLocalizer,
        answer_prompt: PromptDefinition,
    ) -> Self {
        Self {
            retriever,
            providers,
            classifier,
            spans,
            answer_prompt,
            request_timeout: None,
        }
    }

    /// Wire the production backends from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let retriever = Arc::new(WikipediaRetriever::new(&config.retrieval)?);
        let providers = ProviderPair::new(
            AnswerProvider::from_config(config, ProviderType::OpenAI),
            AnswerProvider::from_config(config, ProviderType::Together),
        );
        let classifier = Arc::new(HuggingFaceClassifier::new(
            &config.detection.classifier,
            config.resolve_classifier_token(),
        )?);
        let detector = Arc::new(HttpSpanDetector::new(
            &config.detection.spans,
            config.resolve_span_token(),
        )?);
        let answer_prompt = load_prompt(&config.workspace, ANSWER_PROMPT_ID)?;
        let spans = SpanLocalizer::new(detector);

        debug!(
            openai = providers.openai.is_available(),
            together = providers.together.is_available(),
            classifier = classifier.backend_name(),
            spans = spans.backend_name(),
            "Pipeline wired"
        );

        let timeout = match config.pipeline.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self::new(
            retriever,
            providers,
            classifier,
            spans,
            answer_prompt,
        )
        .with_request_timeout(timeout))
    }

    /// Deadline applied to every query; `None` disables it.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn providers(&self) -> &ProviderPair<AnswerProvider> {
        &self.providers
    }

    /// Run one query to completion.
    pub async fn run(&self, query: &str) -> PipelineResult {
        self.run_with_cancel(query, CancelToken::none()).await
    }

    /// Run one query, stopping outstanding sub-tasks when `cancel` fires.
    ///
    /// An interrupted query still returns a full result: interrupted answer
    /// slots carry an error, labels fall back to unknown and spans to empty.
    pub async fn run_with_cancel(&self, query: &str, cancel: CancelToken) -> PipelineResult {
        let cancel = match self.request_timeout {
            Some(timeout) => cancel.with_timeout(timeout),
            None => cancel,
        };
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline", request_id = %request_id);

        async {
            let mut trace = StageTrace::default();
            info!(query_chars = query.chars().count(), "Query received");

            trace.enter(PipelineStage::ContextPending);
            let context = self.fetch_context(query, &cancel).await;
            trace.enter(PipelineStage::ContextReady);

            let prompt = self.build_answer_prompt(&context, query);

            trace.enter(PipelineStage::AnswersPending);
            let (openai, together) = join(
                self.answer_lane(ProviderType::OpenAI, &prompt, &cancel),
                self.answer_lane(ProviderType::Together, &prompt, &cancel),
            )
            .await;
            let answers = ProviderPair::new(openai, together);
            trace.enter(PipelineStage::AnswersReady);

            trace.enter(PipelineStage::ClassifyPending);
            let (openai, together) = join(
                self.classify_lane(&answers.openai, &cancel),
                self.classify_lane(&answers.together, &cancel),
            )
            .await;
            let labels = ProviderPair::new(openai, together);
            trace.enter(PipelineStage::ClassifyReady);

            trace.enter(PipelineStage::SpansPending);
            let (openai, together) = join(
                self.spans_lane(&context, query, &answers.openai, &cancel),
                self.spans_lane(&context, query, &answers.together, &cancel),
            )
            .await;
            let spans = ProviderPair::new(openai, together);
            trace.enter(PipelineStage::Done);

            let lanes = ProviderPair::new(
                LaneReport {
                    answer: answers.openai,
                    hallucination: labels.openai,
                    spans: spans.openai,
                },
                LaneReport {
                    answer: answers.together,
                    hallucination: labels.together,
                    spans: spans.together,
                },
            );

            info!(
                openai_ok = lanes.openai.answer.is_success(),
                together_ok = lanes.together.answer.is_success(),
                "Query complete"
            );

            PipelineResult {
                request_id: request_id.clone(),
                query: query.to_string(),
                context,
                lanes,
                trace: trace.into_stages(),
            }
        }
        .instrument(span)
        .await
    }

    async fn fetch_context(&self, query: &str, cancel: &CancelToken) -> Context {
        match cancel.guard(self.retriever.retrieve(query)).await {
            Ok(context) => {
                debug!(
                    source = self.retriever.source_name(),
                    fallback = context.is_fallback(),
                    "Context ready"
                );
                context
            }
            Err(reason) => {
                warn!("Context retrieval interrupted: {}", reason);
                Context::not_found()
            }
        }
    }

    fn build_answer_prompt(&self, context: &Context, query: &str) -> Result<BuiltPrompt, String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.text.clone());
        vars.insert("question".to_string(), query.to_string());

        build_prompt(&self.answer_prompt, vars).map_err(|e| {
            warn!("Answer prompt could not be built: {}", e);
            e.to_string()
        })
    }

    async fn answer_lane(
        &self,
        id: ProviderType,
        prompt: &Result<BuiltPrompt, String>,
        cancel: &CancelToken,
    ) -> ProviderAnswer {
        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(e) => return ProviderAnswer::failure(id, ProviderError::Backend(e.clone())),
        };

        match cancel.guard(self.providers.get(id).answer(prompt)).await {
            Ok(answer) => answer,
            Err(reason) => {
                warn!(provider = id.as_str(), "Answer interrupted: {}", reason);
                ProviderAnswer::failure(id, reason.into())
            }
        }
    }

    async fn classify_lane(
        &self,
        answer: &ProviderAnswer,
        cancel: &CancelToken,
    ) -> HallucinationLabel {
        let provider = answer.provider.as_str();
        let Some(text) = answer.text() else {
            debug!(provider, error = ?answer.error(), "Skipping classification of failed answer");
            return HallucinationLabel::unknown();
        };

        match cancel.guard(self.classifier.classify(text)).await {
            Ok(Ok(label)) => label,
            Ok(Err(e)) => {
                warn!(
                    provider,
                    backend = self.classifier.backend_name(),
                    "Classification failed: {}", e
                );
                HallucinationLabel::unknown()
            }
            Err(reason) => {
                warn!(provider, "Classification interrupted: {}", reason);
                interrupted_label(reason)
            }
        }
    }

    async fn spans_lane(
        &self,
        context: &Context,
        query: &str,
        answer: &ProviderAnswer,
        cancel: &CancelToken,
    ) -> Vec<HallucinationSpan> {
        let provider = answer.provider.as_str();
        let Some(text) = answer.text() else {
            debug!(provider, "Skipping span localization of failed answer");
            return Vec::new();
        };

        cancel
            .guard(self.spans.localize_spans(&context.text, query, text))
            .await
            .unwrap_or_else(|reason| {
                warn!(provider, "Span localization interrupted: {}", reason);
                Vec::new()
            })
    }
}

/// Label slot for a classification stopped by cancellation or the deadline.
fn interrupted_label(reason: Interrupted) -> HallucinationLabel {
    HallucinationLabel::placeholder(match reason {
        Interrupted::Cancelled => Verdict::Cancelled,
        Interrupted::TimedOut => Verdict::TimedOut,
    })
}
