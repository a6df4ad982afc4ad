//! Veriqa Core Library
//!
//! This crate provides the foundational utilities shared by every Veriqa crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
