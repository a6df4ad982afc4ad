//! Hugging Face Inference API text-classification backend.
//!
//! API: `POST {endpoint}/models/{model}` with `{"inputs": "..."}`. The
//! response is a list of `{label, score}` predictions, sometimes nested one
//! level deeper.

use crate::classifier::{truncate_words, HallucinationClassifier};
use crate::types::{HallucinationLabel, LabelMap, Verdict};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use veriqa_core::config::ClassifierConfig;
use veriqa_core::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    error: String,
}

impl InferenceResponse {
    /// All returned candidates with a usable score.
    fn into_predictions(self) -> Vec<Prediction> {
        let predictions = match self {
            Self::Nested(groups) => groups.into_iter().flatten().collect::<Vec<_>>(),
            Self::Flat(predictions) => predictions,
        };

        predictions
            .into_iter()
            .filter(|p| p.score.is_finite())
            .collect()
    }
}

/// Classifier backed by a hosted text-classification model.
pub struct HuggingFaceClassifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    max_input_words: usize,
    labels: LabelMap,
}

impl HuggingFaceClassifier {
    /// Create a classifier from config and an optional inference token.
    pub fn new(config: &ClassifierConfig, token: Option<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Detection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!(
                "{}/models/{}",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            token,
            max_input_words: config.max_input_words.max(1),
            labels: LabelMap::new(config.labels.clone()),
        })
    }

    fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<InferenceError>(body) {
            Ok(err) => format!("Classifier error ({}): {}", status, err.error),
            Err(_) => format!("Classifier error ({}): {}", status, body),
        }
    }

    /// The top prediction picks the verdict; the score is the probability of
    /// hallucination.
    fn to_label(&self, response: InferenceResponse) -> AppResult<HallucinationLabel> {
        let predictions = response.into_predictions();
        let top = predictions
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| AppError::Detection("Classifier returned no predictions".to_string()))?;

        let verdict = self.labels.resolve(&top.label);
        let score = self.hallucination_probability(&predictions, &verdict, top.score);
        Ok(HallucinationLabel::new(verdict, score))
    }

    /// Score of the prediction mapped to `hallucinated` when the backend
    /// returned one. Otherwise the complement of a `supported` top score, or
    /// the raw top score for unmapped labels.
    fn hallucination_probability(
        &self,
        predictions: &[Prediction],
        verdict: &Verdict,
        top_score: f64,
    ) -> f64 {
        let hallucinated = predictions
            .iter()
            .find(|p| self.labels.resolve(&p.label) == Verdict::Hallucinated);

        match (hallucinated, verdict) {
            (Some(p), _) => p.score,
            (None, Verdict::Supported) => 1.0 - top_score,
            (None, _) => top_score,
        }
    }
}

#[async_trait::async_trait]
impl HallucinationClassifier for HuggingFaceClassifier {
    fn backend_name(&self) -> &str {
        "huggingface"
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn classify(&self, text: &str) -> AppResult<HallucinationLabel> {
        if text.trim().is_empty() {
            return Err(AppError::Detection("Nothing to classify".to_string()));
        }

        let inputs = truncate_words(text, self.max_input_words);
        if inputs.len() < text.len() {
            debug!(
                "Truncated classifier input from {} to {} bytes",
                text.len(),
                inputs.len()
            );
        }

        let mut request = self.client.post(&self.url).json(&InferenceRequest {
            inputs,
            options: InferenceOptions {
                wait_for_model: true,
            },
        });
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Detection(format!("Failed to reach classifier: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Detection(Self::describe_error(status, &body)));
        }

        let parsed: InferenceResponse = response
            .json()
            .await
            .map_err(|e| AppError::Detection(format!("Malformed classifier response: {}", e)))?;

        let label = self.to_label(parsed)?;
        debug!(label = %label.label, score = label.score, "Classified answer");
        Ok(label)
    }
}
