//! Veriqa answer pipeline.
//!
//! Retrieves one context passage per query, asks both answer providers,
//! classifies each answer and localizes unsupported spans. Also hosts the
//! query refiner and the endpoint handlers.

pub mod api;
pub mod cancel;
pub mod orchestrator;
pub mod provider;
pub mod refiner;
pub mod stage;
pub mod types;

#[cfg(test)]
mod tests;

pub use api::{handle_improve_query, handle_query, ApiResponse, QueryRequest, Service};
pub use cancel::{CancelHandle, CancelToken, Interrupted};
pub use orchestrator::Pipeline;
pub use provider::AnswerProvider;
pub use refiner::{QueryRefiner, RefinementError};
pub use stage::PipelineStage;
pub use types::{
    LaneReport, PipelineResult, ProviderAnswer, ProviderError, ProviderPair, QueryResponse,
};
