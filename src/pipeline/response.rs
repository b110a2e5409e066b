//! Response unwrapping: raw service text → list of raw question candidates.
//!
//! Models are told to emit bare JSON and frequently wrap it in a
//! ```` ```json ```` fence anyway, or lead with a sentence of chatter. This
//! module undoes both before parsing. It only checks the *envelope*
//! (`{"questions": [...]}`); individual candidates are judged by
//! [`crate::pipeline::review`], so one bad question cannot sink the batch.

use crate::error::QuizError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A whole-body fence, optionally tagged (```json, ```JSON, ```javascript …).
static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)\r?\n?```\s*$").unwrap());

#[derive(Debug, Deserialize)]
struct Envelope {
    questions: Vec<Value>,
}

/// Remove outer triple-backtick fencing, if present.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Parse the service response into raw question candidates.
///
/// Tries the unwrapped body first, then the outermost `{…}` span inside it.
pub fn parse_candidates(raw: &str) -> Result<Vec<Value>, QuizError> {
    let body = strip_code_fences(raw);

    let first_err = match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => return Ok(envelope.questions),
        Err(e) => e,
    };

    if let Some(span) = outermost_object(body) {
        if span.len() != body.len() {
            if let Ok(envelope) = serde_json::from_str::<Envelope>(span) {
                debug!("Recovered quiz JSON from surrounding prose");
                return Ok(envelope.questions);
            }
        }
    }

    Err(QuizError::MalformedResponse {
        detail: format!("{} (response starts with {:?})", first_err, preview(body)),
    })
}

fn outermost_object(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

fn preview(body: &str) -> String {
    body.chars().take(60).collect()
}
