//! Extraction quality gate.
//!
//! Decides whether normalised text is worth sending to the generator. Two
//! checks run in order:
//!
//! 1. **Length** — fewer than `min_chars` characters almost always means the
//!    PDF is a scan with no text layer.
//! 2. **Meaningful words** — enough characters, but made of glyph codes and
//!    font names rather than prose. A token counts when it is longer than two
//!    characters, starts with a letter, carries case information, and is not
//!    an all-uppercase acronym/noise run.

use crate::error::QuizError;
use serde::{Deserialize, Serialize};

/// Minimum extraction quality required before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Minimum length of the normalised text, in characters. Default: 50.
    pub min_chars: usize,
    /// Minimum number of meaningful words. Default: 10.
    pub min_meaningful_words: usize,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_chars: 50,
            min_meaningful_words: 10,
        }
    }
}

/// Why an extraction was judged unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InsufficientText,
    LowQualityText,
}

/// The outcome of judging one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub reason: Option<String>,
    pub meaningful_word_count: usize,
    pub char_count: usize,
    #[serde(skip)]
    rejection: Option<RejectionReason>,
    #[serde(skip)]
    thresholds: ValidationThresholds,
}

impl ValidationVerdict {
    pub fn rejection(&self) -> Option<RejectionReason> {
        self.rejection
    }

    /// Convert a negative verdict into the matching extraction-quality error.
    pub fn into_result(self) -> Result<ValidationVerdict, QuizError> {
        match self.rejection {
            None => Ok(self),
            Some(RejectionReason::InsufficientText) => Err(QuizError::InsufficientText {
                chars: self.char_count,
                min_chars: self.thresholds.min_chars,
            }),
            Some(RejectionReason::LowQualityText) => Err(QuizError::LowQualityText {
                meaningful_words: self.meaningful_word_count,
                min_words: self.thresholds.min_meaningful_words,
                chars: self.char_count,
            }),
        }
    }
}

/// Judge whether `text` is long enough and word-like enough to quiz on.
pub fn validate_text(text: &str, thresholds: &ValidationThresholds) -> ValidationVerdict {
    let char_count = text.chars().count();
    let meaningful_word_count = count_meaningful_words(text);

    let rejection = if char_count < thresholds.min_chars {
        Some(RejectionReason::InsufficientText)
    } else if meaningful_word_count < thresholds.min_meaningful_words {
        Some(RejectionReason::LowQualityText)
    } else {
        None
    };

    let reason = rejection.map(|r| match r {
        RejectionReason::InsufficientText => format!(
            "Extracted text is too short ({} of {} characters); the document may be scanned or image-only",
            char_count, thresholds.min_chars
        ),
        RejectionReason::LowQualityText => format!(
            "Extracted text has too few meaningful words ({} of {})",
            meaningful_word_count, thresholds.min_meaningful_words
        ),
    });

    ValidationVerdict {
        is_valid: rejection.is_none(),
        reason,
        meaningful_word_count,
        char_count,
        rejection,
        thresholds: *thresholds,
    }
}

/// Validate and fail fast with a typed error.
pub fn ensure_usable(
    text: &str,
    thresholds: &ValidationThresholds,
) -> Result<ValidationVerdict, QuizError> {
    validate_text(text, thresholds).into_result()
}

/// Count whitespace-separated tokens that look like genuine prose words.
pub fn count_meaningful_words(text: &str) -> usize {
    text.split_whitespace().filter(|w| is_meaningful_word(w)).count()
}

fn is_meaningful_word(word: &str) -> bool {
    let len = word.chars().count();
    if len <= 2 {
        return false;
    }
    if !word.chars().next().is_some_and(char::is_alphabetic) {
        return false;
    }
    let upper = word.to_uppercase();
    let lower = word.to_lowercase();
    if upper == lower {
        return false;
    }
    !(word == upper && len >= 3)
}
