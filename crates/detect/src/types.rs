//! Hallucination detection result types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Coarse whole-answer verdict.
///
/// Backends may report labels other than the two well-known ones; those are
/// carried through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    Supported,
    Hallucinated,
    /// Classification could not be performed
    Unknown,
    /// Classification was cancelled by the caller
    Cancelled,
    /// Classification ran past the query deadline
    TimedOut,
    Other(String),
}

impl Verdict {
    /// Parse a verdict name, case-insensitively.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "supported" => Self::Supported,
            "hallucinated" => Self::Hallucinated,
            "unknown" => Self::Unknown,
            "cancelled" => Self::Cancelled,
            "timed_out" => Self::TimedOut,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Supported => "supported",
            Self::Hallucinated => "hallucinated",
            Self::Unknown => "unknown",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Verdict::parse(&s))
    }
}

/// Maps backend-specific labels (e.g. `LABEL_1`) to verdicts.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    labels: HashMap<String, String>,
}

impl LabelMap {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    /// Resolve a raw backend label. Unmapped labels are parsed as-is.
    pub fn resolve(&self, raw: &str) -> Verdict {
        match self.labels.get(raw) {
            Some(mapped) => Verdict::parse(mapped),
            None => Verdict::parse(raw),
        }
    }
}

/// Round a score to 3 decimal digits after clamping it into `[0, 1]`.
///
/// Non-finite scores become 0.
pub fn round_score(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    (score.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
}

/// Whole-answer classification result.
///
/// `score` is the probability that the text is hallucinated, so a
/// supported answer scores below 0.5 and a hallucinated one above it.
/// Placeholders carry 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationLabel {
    pub label: Verdict,
    pub score: f64,
}

impl HallucinationLabel {
    /// Build a label; the score is clamped and rounded.
    pub fn new(label: Verdict, score: f64) -> Self {
        Self {
            label,
            score: round_score(score),
        }
    }

    /// Placeholder used when classification failed or was not attempted.
    pub fn unknown() -> Self {
        Self::placeholder(Verdict::Unknown)
    }

    /// Score-less label, e.g. `Cancelled` for an interrupted classification.
    pub fn placeholder(label: Verdict) -> Self {
        Self { label, score: 0.0 }
    }

    /// Whether a backend actually produced this label.
    pub fn is_scored(&self) -> bool {
        !matches!(
            self.label,
            Verdict::Unknown | Verdict::Cancelled | Verdict::TimedOut
        )
    }
}

/// One unsupported span of an answer, as reported by the span detector.
///
/// Offsets are character offsets into the answer text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationSpan {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}
