//! Command handlers for the Veriqa CLI.

pub mod call;
pub mod context;
pub mod improve;
pub mod prompts;
pub mod query;

pub use call::CallCommand;
pub use context::ContextCommand;
pub use improve::ImproveCommand;
pub use prompts::PromptsCommand;
pub use query::QueryCommand;
