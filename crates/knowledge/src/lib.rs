//! Context retrieval for Veriqa.
//!
//! Turns a user question into a short passage from an external knowledge
//! source. Retrieval is best-effort: failures become fixed fallback text,
//! never errors.

pub mod retriever;
pub mod types;
pub mod wikipedia;

pub use retriever::{ContextRetriever, StaticRetriever};
pub use types::{Context, ContextSource, NOT_FOUND_FALLBACK, NO_SUMMARY_FALLBACK};
pub use wikipedia::WikipediaRetriever;
