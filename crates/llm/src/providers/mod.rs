//! Chat-completion provider implementations.

mod chat;
pub mod openai;
pub mod together;

pub use openai::OpenAiClient;
pub use together::TogetherClient;
