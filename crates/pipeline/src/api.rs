//! Transport-agnostic endpoint handlers.
//!
//! Handlers take a decoded request and return a status plus JSON body. Any
//! HTTP server can mount [`Service::handle`] directly.

use crate::orchestrator::Pipeline;
use crate::refiner::{QueryRefiner, RefinementError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};
use veriqa_core::{AppConfig, AppResult};

pub const QUERY_PATH: &str = "/query";
pub const IMPROVE_QUERY_PATH: &str = "/improve_query";

/// Body accepted by both endpoints. A missing or null `input` is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub input: Option<String>,
}

impl QueryRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
        }
    }

    pub fn input(&self) -> &str {
        self.input.as_deref().unwrap_or("")
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `POST /query`: answer with both providers and score both answers.
pub async fn handle_query(pipeline: &Pipeline, request: QueryRequest) -> ApiResponse {
    let result = pipeline.run(request.input()).await;
    match serde_json::to_value(result.to_response()) {
        Ok(body) => ApiResponse::ok(body),
        Err(e) => {
            error!(request_id = %result.request_id, "Failed to encode query response: {}", e);
            ApiResponse::error(500, e.to_string())
        }
    }
}

/// `POST /improve_query`: rewrite the input question.
pub async fn handle_improve_query(refiner: &QueryRefiner, request: QueryRequest) -> ApiResponse {
    match refiner.improve_query(request.input()).await {
        Ok(improved) => ApiResponse::ok(json!({ "improved_query": improved })),
        Err(e @ RefinementError::EmptyInput) => ApiResponse::error(400, e.to_string()),
        Err(e @ RefinementError::Backend(_)) => ApiResponse::error(500, e.to_string()),
    }
}

/// Both endpoints behind one router.
pub struct Service {
    pipeline: Pipeline,
    refiner: QueryRefiner,
}

impl Service {
    pub fn new(pipeline: Pipeline, refiner: QueryRefiner) -> Self {
        Self { pipeline, refiner }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self::new(
            Pipeline::from_config(config)?,
            QueryRefiner::from_config(config)?,
        ))
    }

    /// Route a raw request. Unknown paths get 404, other methods on known
    /// paths get 405, and undecodable bodies get 400.
    pub async fn handle(&self, method: &str, path: &str, body: &[u8]) -> ApiResponse {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        debug!(method, path, "Routing request");

        if path != QUERY_PATH && path != IMPROVE_QUERY_PATH {
            return ApiResponse::error(404, format!("No route for {}", path));
        }
        if !method.eq_ignore_ascii_case("POST") {
            return ApiResponse::error(405, format!("Method {} not allowed on {}", method, path));
        }

        let request: QueryRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                debug!("Rejecting body: {}", e);
                return ApiResponse::error(400, "Invalid JSON body");
            }
        };

        if path == QUERY_PATH {
            handle_query(&self.pipeline, request).await
        } else {
            handle_improve_query(&self.refiner, request).await
        }
    }
}
