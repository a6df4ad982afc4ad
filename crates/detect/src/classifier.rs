//! Whole-answer hallucination classification.

use crate::types::HallucinationLabel;
use unicode_segmentation::UnicodeSegmentation;
use veriqa_core::AppResult;

/// Scores one text for likely fabrication.
#[async_trait::async_trait]
pub trait HallucinationClassifier: Send + Sync {
    /// Backend name (e.g., "huggingface").
    fn backend_name(&self) -> &str;

    /// Classify a single text.
    ///
    /// Implementations truncate overlong input instead of rejecting it, and
    /// return scores rounded to 3 decimals.
    async fn classify(&self, text: &str) -> AppResult<HallucinationLabel>;
}

/// Cut `text` after its first `max_words` Unicode words.
///
/// The returned slice keeps the original text up to the end of the last kept
/// word, so punctuation and spacing inside the kept region are preserved.
pub fn truncate_words(text: &str, max_words: usize) -> &str {
    if max_words == 0 {
        return "";
    }

    match text.unicode_word_indices().nth(max_words - 1) {
        Some((start, word)) => {
            let end = start + word.len();
            if text[end..].unicode_words().next().is_some() {
                &text[..end]
            } else {
                text
            }
        }
        None => text,
    }
}
