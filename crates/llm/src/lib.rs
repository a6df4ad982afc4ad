//! LLM integration crate for Veriqa.
//!
//! This crate provides a provider-agnostic abstraction over chat-completion
//! backends. Each backend has its own auth, request defaults and error
//! reporting behind the shared [`LlmClient`] trait.
//!
//! # Providers
//! - **OpenAI**: `gpt-3.5-turbo` by default
//! - **Together.ai**: `meta-llama/Llama-Vision-Free` by default
//!
//! # Example
//! ```no_run
//! use veriqa_llm::{LlmClient, LlmRequest, providers::OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new("sk-...");
//! let request = LlmRequest::new("What is the capital of France?", "gpt-3.5-turbo")
//!     .with_system("Answer in one sentence.");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_openai_client};
pub use providers::{OpenAiClient, TogetherClient};
pub use types::ProviderType;
