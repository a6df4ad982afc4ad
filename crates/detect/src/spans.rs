//! Span-level hallucination localization.

use crate::types::HallucinationSpan;
use std::sync::Arc;
use tracing::warn;
use veriqa_core::AppResult;

/// Backend that relates an answer to its context and reports unsupported spans.
#[async_trait::async_trait]
pub trait SpanDetector: Send + Sync {
    /// Backend name (e.g., "lettucedetect").
    fn backend_name(&self) -> &str;

    /// Predict unsupported spans of `answer`.
    async fn predict(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> AppResult<Vec<HallucinationSpan>>;
}

/// Wraps a [`SpanDetector`] so that span detection never fails a query.
///
/// Spans are passed through exactly as the backend reports them. Any backend
/// failure yields an empty list and a warning.
#[derive(Clone)]
pub struct SpanLocalizer {
    detector: Arc<dyn SpanDetector>,
}

impl SpanLocalizer {
    pub fn new(detector: Arc<dyn SpanDetector>) -> Self {
        Self { detector }
    }

    pub fn backend_name(&self) -> &str {
        self.detector.backend_name()
    }

    /// Localize unsupported spans; empty on failure.
    pub async fn localize_spans(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Vec<HallucinationSpan> {
        match self.detector.predict(context, question, answer).await {
            Ok(spans) => spans,
            Err(e) => {
                warn!(
                    backend = self.detector.backend_name(),
                    "Span detection failed: {}", e
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriqa_core::AppError;

    struct FixedDetector(Vec<HallucinationSpan>);

    #[async_trait::async_trait]
    impl SpanDetector for FixedDetector {
        fn backend_name(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _: &str, _: &str, _: &str) -> AppResult<Vec<HallucinationSpan>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;

    #[async_trait::async_trait]
    impl SpanDetector for BrokenDetector {
        fn backend_name(&self) -> &str {
            "broken"
        }

        async fn predict(&self, _: &str, _: &str, _: &str) -> AppResult<Vec<HallucinationSpan>> {
            Err(AppError::Detection("model not loaded".to_string()))
        }
    }

    fn span(start: usize, end: usize, text: &str) -> HallucinationSpan {
        HallucinationSpan {
            start,
            end,
            text: text.to_string(),
            confidence: Some(0.93),
        }
    }

    #[tokio::test]
    async fn test_spans_passed_through_exactly() {
        // Out-of-order and overlapping spans are not normalized
        let reported = vec![span(30, 40, "in 1889"), span(0, 12, "The tower"), span(5, 35, "x")];
        let localizer = SpanLocalizer::new(Arc::new(FixedDetector(reported.clone())));

        let spans = localizer.localize_spans("ctx", "q", "answer").await;
        assert_eq!(spans, reported);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let localizer = SpanLocalizer::new(Arc::new(BrokenDetector));
        let spans = localizer.localize_spans("ctx", "q", "answer").await;
        assert!(spans.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_calls_agree() {
        let localizer = SpanLocalizer::new(Arc::new(FixedDetector(vec![span(0, 5, "Paris")])));
        let first = localizer.localize_spans("c", "q", "Paris is big").await;
        let second = localizer.localize_spans("c", "q", "Paris is big").await;
        assert_eq!(first, second);
    }
}
