//! Error types for Veriqa.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM backends, context retrieval,
//! hallucination detection, and prompts.

use thiserror::Error;

/// Unified error type for Veriqa.
///
/// Backend clients return `Result<T, AppError>`. The answer pipeline turns
/// these into per-slot placeholders instead of propagating them.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Context retrieval errors (search and summary lookups)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Hallucination classification and span detection errors
    #[error("Detection error: {0}")]
    Detection(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        assert_eq!(
            AppError::Llm("boom".to_string()).to_string(),
            "LLM error: boom"
        );
        assert_eq!(
            AppError::Detection("no backend".to_string()).to_string(),
            "Detection error: no backend"
        );
        assert_eq!(AppError::Other("plain".to_string()).to_string(), "plain");
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Serialization(_)));
    }
}
