//! Structural review of question candidates.
//!
//! Each raw candidate is checked on its own. Invalid entries are dropped and
//! logged; the batch is accepted as long as one entry survives. A candidate
//! is kept only when:
//!
//! * `question` is a non-blank string,
//! * `options` is an array of exactly four strings,
//! * `correct` is an integer in `0..=3`,
//! * `explanation` is a non-blank string.
//!
//! Image- and video-derived quizzes come back in the same JSON shape, so
//! [`validate_quiz_response`] is public for those sources to reuse.

use crate::error::QuizError;
use crate::output::{QuestionCandidate, QuizResult};
use crate::pipeline::response::parse_candidates;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Why a single candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateDefect {
    NotAnObject,
    MissingQuestion,
    WrongOptionCount(usize),
    NonStringOption,
    CorrectOutOfRange,
    MissingExplanation,
}

impl fmt::Display for CandidateDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateDefect::NotAnObject => write!(f, "candidate is not a JSON object"),
            CandidateDefect::MissingQuestion => write!(f, "question text is missing or blank"),
            CandidateDefect::WrongOptionCount(n) => write!(f, "expected 4 options, got {n}"),
            CandidateDefect::NonStringOption => write!(f, "an option is not a string"),
            CandidateDefect::CorrectOutOfRange => {
                write!(f, "correct index is missing or outside 0..=3")
            }
            CandidateDefect::MissingExplanation => write!(f, "explanation is missing or blank"),
        }
    }
}

/// Check one raw candidate.
pub fn check_candidate(value: &Value) -> Result<QuestionCandidate, CandidateDefect> {
    let obj = value.as_object().ok_or(CandidateDefect::NotAnObject)?;

    let question = non_blank(obj.get("question")).ok_or(CandidateDefect::MissingQuestion)?;

    let options = match obj.get("options").and_then(Value::as_array) {
        Some(opts) => opts,
        None => return Err(CandidateDefect::WrongOptionCount(0)),
    };
    if options.len() != 4 {
        return Err(CandidateDefect::WrongOptionCount(options.len()));
    }
    let options: Vec<String> = options
        .iter()
        .map(|o| o.as_str().map(str::to_string))
        .collect::<Option<_>>()
        .ok_or(CandidateDefect::NonStringOption)?;
    let options: [String; 4] = options
        .try_into()
        .map_err(|v: Vec<String>| CandidateDefect::WrongOptionCount(v.len()))?;

    let correct_index = obj
        .get("correct")
        .and_then(Value::as_u64)
        .filter(|i| *i <= 3)
        .ok_or(CandidateDefect::CorrectOutOfRange)? as usize;

    let explanation =
        non_blank(obj.get("explanation")).ok_or(CandidateDefect::MissingExplanation)?;

    Ok(QuestionCandidate {
        question,
        options,
        correct_index,
        explanation,
    })
}

/// Keep the structurally valid candidates; fail if none remain.
pub fn review_candidates(candidates: Vec<Value>) -> Result<QuizResult, QuizError> {
    let received = candidates.len();
    let accepted: Vec<QuestionCandidate> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, value)| match check_candidate(value) {
            Ok(q) => Some(q),
            Err(defect) => {
                warn!("Dropping question candidate {}: {}", i + 1, defect);
                None
            }
        })
        .collect();

    debug!("Accepted {}/{} question candidates", accepted.len(), received);
    QuizResult::new(accepted, received)
}

/// Parse a raw service response and review its candidates.
pub fn validate_quiz_response(raw: &str) -> Result<QuizResult, QuizError> {
    review_candidates(parse_candidates(raw)?)
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
