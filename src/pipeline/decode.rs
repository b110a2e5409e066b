//! Payload decoding: base64 document → raw bytes.
//!
//! Browsers and HTTP clients hand documents over as base64 strings, often as
//! a `data:` URL and sometimes wrapped at 76 columns. Both wrappers are
//! tolerated; anything else that is not standard-alphabet base64 is rejected
//! with [`QuizError::Decode`].

use crate::error::QuizError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Decode a base64 document payload into raw bytes.
pub fn decode_document(payload: &str) -> Result<Vec<u8>, QuizError> {
    let body = strip_data_url(payload.trim());
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| QuizError::Decode {
        detail: e.to_string(),
    })?;

    debug!("Decoded {} base64 chars → {} bytes", compact.len(), bytes.len());
    Ok(bytes)
}

/// Encode raw bytes as a standard base64 payload.
pub fn encode_document(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Strip a `data:<mime>;base64,` prefix if present.
fn strip_data_url(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((header, body)) = payload.split_once(',') {
            if header.ends_with(";base64") {
                return body;
            }
        }
    }
    payload
}
