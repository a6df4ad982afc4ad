//! Per-query result types.

use crate::cancel::Interrupted;
use crate::stage::PipelineStage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use veriqa_core::AppError;
use veriqa_detect::{HallucinationLabel, HallucinationSpan};
use veriqa_knowledge::Context;
use veriqa_llm::ProviderType;

/// One value per answer provider, always both present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderPair<T> {
    pub openai: T,
    pub together: T,
}

impl<T> ProviderPair<T> {
    pub fn new(openai: T, together: T) -> Self {
        Self { openai, together }
    }

    pub fn get(&self, id: ProviderType) -> &T {
        match id {
            ProviderType::OpenAI => &self.openai,
            ProviderType::Together => &self.together,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderType, &T)> {
        [
            (ProviderType::OpenAI, &self.openai),
            (ProviderType::Together, &self.together),
        ]
        .into_iter()
    }
}

/// Why a provider produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The backend call failed (transport, HTTP status, malformed reply)
    #[error("{0}")]
    Backend(String),

    /// The provider could not be constructed, e.g. its API key is missing
    #[error("{0}")]
    Unavailable(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out")]
    TimedOut,
}

impl From<AppError> for ProviderError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Llm(msg) => Self::Backend(msg),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<Interrupted> for ProviderError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::TimedOut => Self::TimedOut,
        }
    }
}

/// Outcome of one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAnswer {
    pub provider: ProviderType,
    pub result: Result<String, ProviderError>,
}

impl ProviderAnswer {
    pub fn success(provider: ProviderType, text: impl Into<String>) -> Self {
        Self {
            provider,
            result: Ok(text.into()),
        }
    }

    pub fn failure(provider: ProviderType, error: ProviderError) -> Self {
        Self {
            provider,
            result: Err(error),
        }
    }

    /// The answer text, if the call succeeded.
    pub fn text(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&ProviderError> {
        self.result.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Text placed in the answer slot: the answer, or `Error from <Provider>: <detail>`.
    pub fn display_text(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(e) => format!("Error from {}: {}", self.provider.display_name(), e),
        }
    }
}

/// Everything produced for one provider lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneReport {
    pub answer: ProviderAnswer,
    pub hallucination: HallucinationLabel,
    pub spans: Vec<HallucinationSpan>,
}

/// Complete result of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub request_id: String,
    pub query: String,
    pub context: Context,
    pub lanes: ProviderPair<LaneReport>,
    pub trace: Vec<PipelineStage>,
}

impl PipelineResult {
    /// Wire body for the query endpoint.
    pub fn to_response(&self) -> QueryResponse {
        QueryResponse::from(self)
    }
}

/// Body returned by the query endpoint. Every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub openai: String,
    pub together: String,
    pub hallucination_openai: HallucinationLabel,
    pub hallucination_together: HallucinationLabel,
    pub hallucination_spans_openai: Vec<HallucinationSpan>,
    pub hallucination_spans_together: Vec<HallucinationSpan>,
}

impl From<&PipelineResult> for QueryResponse {
    fn from(result: &PipelineResult) -> Self {
        let lanes = &result.lanes;
        Self {
            openai: lanes.openai.answer.display_text(),
            together: lanes.together.answer.display_text(),
            hallucination_openai: lanes.openai.hallucination.clone(),
            hallucination_together: lanes.together.hallucination.clone(),
            hallucination_spans_openai: lanes.openai.spans.clone(),
            hallucination_spans_together: lanes.together.spans.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriqa_detect::Verdict;

    #[test]
    fn test_display_text() {
        let ok = ProviderAnswer::success(ProviderType::OpenAI, "Paris.");
        assert_eq!(ok.display_text(), "Paris.");
        assert_eq!(ok.text(), Some("Paris."));

        let failed = ProviderAnswer::failure(
            ProviderType::Together,
            ProviderError::Backend("401 Unauthorized".to_string()),
        );
        assert_eq!(failed.display_text(), "Error from Together.ai: 401 Unauthorized");
        assert!(failed.text().is_none());

        let timed_out = ProviderAnswer::failure(ProviderType::OpenAI, Interrupted::TimedOut.into());
        assert_eq!(timed_out.display_text(), "Error from OpenAI: request timed out");
    }

    #[test]
    fn test_llm_error_detail_is_unwrapped() {
        let err: ProviderError = AppError::Llm("connection refused".to_string()).into();
        assert_eq!(err, ProviderError::Backend("connection refused".to_string()));
    }

    #[test]
    fn test_pair_get_and_iter_order() {
        let pair = ProviderPair::new("a", "b");
        assert_eq!(*pair.get(ProviderType::OpenAI), "a");
        assert_eq!(*pair.get(ProviderType::Together), "b");
        let ids: Vec<_> = pair.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ProviderType::OpenAI, ProviderType::Together]);
    }

    #[test]
    fn test_response_has_all_keys() {
        let lane = |answer| LaneReport {
            answer,
            hallucination: HallucinationLabel::new(Verdict::Supported, 0.12345),
            spans: Vec::new(),
        };
        let result = PipelineResult {
            request_id: "r".to_string(),
            query: "q".to_string(),
            context: Context::not_found(),
            lanes: ProviderPair::new(
                lane(ProviderAnswer::success(ProviderType::OpenAI, "a")),
                lane(ProviderAnswer::success(ProviderType::Together, "b")),
            ),
            trace: Vec::new(),
        };

        let value = serde_json::to_value(result.to_response()).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "hallucination_openai",
                "hallucination_spans_openai",
                "hallucination_spans_together",
                "hallucination_together",
                "openai",
                "together",
            ]
        );
        assert_eq!(value["hallucination_openai"]["score"], 0.123);
        assert_eq!(value["hallucination_openai"]["label"], "supported");
    }
}
