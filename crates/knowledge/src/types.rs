//! Context types.

use serde::{Deserialize, Serialize};

/// Returned when the search step finds nothing usable.
pub const NOT_FOUND_FALLBACK: &str = "No relevant information found on Wikipedia.";

/// Returned when the summary step has no extract for the chosen title.
pub const NO_SUMMARY_FALLBACK: &str = "No summary found.";

/// How a context passage was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextSource {
    /// Summary extract of the top search hit
    Article { title: String },
    /// Search returned no hits, or could not be performed
    NotFound,
    /// A title was found but its summary could not be obtained
    NoSummary { title: String },
}

/// A context passage produced once per query and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Text handed to the answer providers and the span detector
    pub text: String,

    /// Provenance of `text`
    pub source: ContextSource,
}

impl Context {
    /// Context built from a summary extract.
    pub fn article(title: impl Into<String>, extract: impl Into<String>) -> Self {
        Self {
            text: extract.into(),
            source: ContextSource::Article {
                title: title.into(),
            },
        }
    }

    /// The "not found" fallback.
    pub fn not_found() -> Self {
        Self {
            text: NOT_FOUND_FALLBACK.to_string(),
            source: ContextSource::NotFound,
        }
    }

    /// The "no summary" fallback for a known title.
    pub fn no_summary(title: impl Into<String>) -> Self {
        Self {
            text: NO_SUMMARY_FALLBACK.to_string(),
            source: ContextSource::NoSummary {
                title: title.into(),
            },
        }
    }

    /// True when `text` is one of the fallback strings.
    pub fn is_fallback(&self) -> bool {
        !matches!(self.source, ContextSource::Article { .. })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
