//! Hallucination detection for Veriqa.
//!
//! Two independent assessments of a generated answer:
//! - a whole-answer classifier ([`HallucinationClassifier`]) returning a
//!   label and a confidence score
//! - a span localizer ([`SpanLocalizer`]) returning the parts of the answer
//!   the context does not support

pub mod classifier;
pub mod huggingface;
pub mod lettuce;
pub mod spans;
pub mod types;

pub use classifier::{truncate_words, HallucinationClassifier};
pub use huggingface::HuggingFaceClassifier;
pub use lettuce::HttpSpanDetector;
pub use spans::{SpanDetector, SpanLocalizer};
pub use types::{round_score, HallucinationLabel, HallucinationSpan, LabelMap, Verdict};
