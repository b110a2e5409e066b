//! Error types for the edgequake-pdf2quiz library.
//!
//! Every failure the pipeline can produce is a variant of [`QuizError`].
//! The variants fall into three families that callers treat differently:
//!
//! * **Input errors** — the payload could not be decoded or loaded. Fatal;
//!   retrying with the same input cannot help.
//! * **Extraction-quality errors** — the document decoded fine but did not
//!   yield enough usable text (typically a scanned, image-only PDF). The user
//!   must supply a different document. Both variants carry the counts needed
//!   to explain the failure.
//! * **Generation errors** — the text-generation service failed, returned
//!   something unparseable, or returned no structurally valid question. These
//!   are retryable by a higher layer; the core itself never retries.
//!
//! At the outer boundary an error is rendered as an [`ErrorPayload`]
//! (`{"error": ..., "details": ...}`) via [`QuizError::to_payload`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2quiz library.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The document payload is not valid base64.
    #[error("Document payload is not valid base64: {detail}")]
    Decode { detail: String },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The loaded bytes are neither a PDF, base64 text, nor UTF-8 text.
    #[error("Unsupported input '{input}': {reason}")]
    UnsupportedInput { input: String, reason: String },

    // ── Extraction-quality errors ─────────────────────────────────────────
    /// Too little text was recovered to write questions about.
    #[error(
        "Only {chars} characters of text could be extracted (at least {min_chars} required).\n\
This looks like a scanned or image-only PDF."
    )]
    InsufficientText { chars: usize, min_chars: usize },

    /// Enough characters were recovered, but too few look like real words.
    #[error(
        "Extracted text looks like formatting noise: {meaningful_words} meaningful words \
in {chars} characters (at least {min_words} required)."
    )]
    LowQualityText {
        meaningful_words: usize,
        min_words: usize,
        chars: usize,
    },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Transport failure, non-success response, or timeout from the service.
    #[error("Text-generation service error: {message}")]
    GenerationService { message: String },

    /// The service answered, but not with the expected JSON structure.
    #[error("Malformed quiz response: {detail}")]
    MalformedResponse { detail: String },

    /// The response parsed, but every question candidate was invalid.
    #[error("No valid questions in response ({received} candidates received, all rejected)")]
    NoValidQuestions { received: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuizError {
    /// Whether running the whole pipeline again with the same input may succeed.
    ///
    /// Generation failures are transient by nature (network, rate limits, a
    /// glitchy completion). Input and extraction-quality failures are
    /// deterministic functions of the document.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuizError::GenerationService { .. }
                | QuizError::MalformedResponse { .. }
                | QuizError::NoValidQuestions { .. }
                | QuizError::DownloadFailed { .. }
        )
    }

    /// Short machine-stable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QuizError::Decode { .. } => "decode_error",
            QuizError::InputNotFound { .. } => "input_not_found",
            QuizError::DownloadFailed { .. } => "download_failed",
            QuizError::UnsupportedInput { .. } => "unsupported_input",
            QuizError::InsufficientText { .. } => "insufficient_text",
            QuizError::LowQualityText { .. } => "low_quality_text",
            QuizError::ProviderNotConfigured { .. } => "provider_not_configured",
            QuizError::GenerationService { .. } => "generation_service_error",
            QuizError::MalformedResponse { .. } => "malformed_response",
            QuizError::NoValidQuestions { .. } => "no_valid_questions",
            QuizError::OutputWriteFailed { .. } => "output_write_failed",
            QuizError::InvalidConfig(_) => "invalid_config",
            QuizError::Internal(_) => "internal_error",
        }
    }

    /// Render the error as the structured `{error, details}` boundary payload.
    ///
    /// `error` is a short, user-facing headline; `details` carries the
    /// diagnostic text (counts, upstream messages) when there is any.
    pub fn to_payload(&self) -> ErrorPayload {
        let (error, details) = match self {
            QuizError::Decode { detail } => ("Invalid document encoding", Some(detail.clone())),
            QuizError::InsufficientText { .. } => (
                "Could not extract enough text from the document",
                Some(self.to_string()),
            ),
            QuizError::LowQualityText { .. } => (
                "Could not extract readable text from the document",
                Some(self.to_string()),
            ),
            QuizError::GenerationService { message } => {
                ("Quiz generation service failed", Some(message.clone()))
            }
            QuizError::MalformedResponse { detail } => {
                ("Quiz generation returned an unreadable response", Some(detail.clone()))
            }
            QuizError::NoValidQuestions { .. } => {
                ("Quiz generation produced no valid questions", Some(self.to_string()))
            }
            QuizError::ProviderNotConfigured { .. } => {
                ("Quiz generation service is not configured", Some(self.to_string()))
            }
            other => ("Quiz generation failed", Some(other.to_string())),
        };
        ErrorPayload {
            error: error.to_string(),
            details,
        }
    }
}

/// Serializable error shape returned across the outer boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&QuizError> for ErrorPayload {
    fn from(e: &QuizError) -> Self {
        e.to_payload()
    }
}
