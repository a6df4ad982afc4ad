//! Context retriever trait.

use crate::types::Context;

/// Produces a best-effort context passage for a query.
///
/// Implementations never fail outward: lookup problems turn into one of the
/// fallback contexts.
#[async_trait::async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Name of the knowledge source (e.g., "wikipedia").
    fn source_name(&self) -> &str;

    /// Retrieve context for a natural-language query.
    async fn retrieve(&self, query: &str) -> Context;
}

/// Retriever that always returns the same passage.
///
/// Useful for offline runs and tests where the knowledge source must not be
/// contacted.
#[derive(Debug, Clone)]
pub struct StaticRetriever {
    context: Context,
}

impl StaticRetriever {
    pub fn new(context: Context) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl ContextRetriever for StaticRetriever {
    fn source_name(&self) -> &str {
        "static"
    }

    async fn retrieve(&self, _query: &str) -> Context {
        self.context.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_retriever_ignores_query() {
        let retriever = StaticRetriever::new(Context::article("Rust", "Rust is a language."));
        let a = retriever.retrieve("anything").await;
        let b = retriever.retrieve("something else").await;
        assert_eq!(a, b);
        assert_eq!(retriever.source_name(), "static");
    }
}
