//! HTTP client for a LettuceDetect-compatible span detection service.
//!
//! API: `POST {endpoint}/predict` with
//! `{"context": [...], "question": "...", "answer": "...", "output_format": "spans"}`.
//! The service answers with a list of `{start, end, text, confidence}` spans,
//! either bare or wrapped as `{"spans": [...]}`.

use crate::spans::SpanDetector;
use crate::types::HallucinationSpan;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use veriqa_core::config::SpanDetectorConfig;
use veriqa_core::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    context: [&'a str; 1],
    question: &'a str,
    answer: &'a str,
    output_format: &'static str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Bare(Vec<HallucinationSpan>),
    Wrapped { spans: Vec<HallucinationSpan> },
}

impl PredictResponse {
    fn into_spans(self) -> Vec<HallucinationSpan> {
        match self {
            Self::Bare(spans) | Self::Wrapped { spans } => spans,
        }
    }
}

/// Span detector reached over HTTP.
pub struct HttpSpanDetector {
    client: reqwest::Client,
    url: String,
    model: String,
    token: Option<String>,
}

impl HttpSpanDetector {
    pub fn new(config: &SpanDetectorConfig, token: Option<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Detection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("{}/predict", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            token,
        })
    }
}

#[async_trait::async_trait]
impl SpanDetector for HttpSpanDetector {
    fn backend_name(&self) -> &str {
        "lettucedetect"
    }

    #[instrument(skip_all, fields(answer_len = answer.len()))]
    async fn predict(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> AppResult<Vec<HallucinationSpan>> {
        let body = PredictRequest {
            context: [context],
            question,
            answer,
            output_format: "spans",
            model: &self.model,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Detection(format!("Failed to reach span detector: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Detection(format!(
                "Span detector error ({}): {}",
                status, text
            )));
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| {
            AppError::Detection(format!("Malformed span detector response: {}", e))
        })?;

        let spans = parsed.into_spans();
        debug!("Span detector reported {} spans", spans.len());
        Ok(spans)
    }
}
