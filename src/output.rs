//! Output types: the accepted quiz and the statistics of the run that built it.

use crate::error::QuizError;
use crate::pipeline::extract::ExtractionStrategy;
use crate::pipeline::review::check_candidate;
use crate::pipeline::validate::ValidationVerdict;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A multiple-choice question that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCandidate {
    pub question: String,
    pub options: [String; 4],
    /// 0-based index into `options`.
    #[serde(rename = "correct")]
    pub correct_index: usize,
    pub explanation: String,
}

impl QuestionCandidate {
    /// The text of the correct option.
    ///
    /// Panics if `correct_index` is outside `0..=3`, which a candidate taken
    /// from a [`QuizResult`] never is.
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// A non-empty, ordered list of validated questions.
///
/// The only constructor refuses an empty list, so a `QuizResult` in hand
/// always has at least one question. Deserialising applies the same
/// structural checks as the review stage and rejects the whole quiz if any
/// entry fails them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    questions: Vec<QuestionCandidate>,
}

impl QuizResult {
    /// Wrap validated questions. `received` is the number of raw candidates
    /// they were filtered from, reported when nothing survived.
    pub fn new(questions: Vec<QuestionCandidate>, received: usize) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoValidQuestions { received });
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[QuestionCandidate] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn into_questions(self) -> Vec<QuestionCandidate> {
        self.questions
    }
}

impl<'de> Deserialize<'de> for QuizResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            questions: Vec<Value>,
        }
        let raw = Raw::deserialize(deserializer)?;
        let received = raw.questions.len();
        let questions = raw
            .questions
            .iter()
            .enumerate()
            .map(|(i, value)| {
                check_candidate(value).map_err(|defect| {
                    serde::de::Error::custom(format!("question {}: {}", i + 1, defect))
                })
            })
            .collect::<Result<Vec<_>, D::Error>>()?;
        QuizResult::new(questions, received).map_err(serde::de::Error::custom)
    }
}

/// Aggregate statistics for a quiz-generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Characters of normalised text recovered from the document.
    pub extracted_chars: usize,
    /// Meaningful words counted by the extraction validator.
    pub meaningful_words: usize,
    /// Characters of source text actually sent to the service.
    pub context_chars: usize,
    /// Whether the source text was cut to the context budget.
    pub truncated: bool,
    /// Raw question candidates in the service response.
    pub candidates_received: usize,
    /// Candidates that passed structural validation.
    pub candidates_accepted: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub extraction_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutput {
    pub quiz: QuizResult,
    pub stats: GenerationStats,
}

/// LLM-free inspection of what the extractor recovers from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub text: String,
    pub verdict: ValidationVerdict,
    pub fragment_counts: Vec<(ExtractionStrategy, usize)>,
}
