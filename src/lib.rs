//! # edgequake-pdf2quiz
//!
//! Turn an uploaded PDF into a short multiple-choice quiz that is grounded in
//! the document's own text.
//!
//! ## Why this crate?
//!
//! Quiz generation is only useful when every question can be answered from
//! the source. Scanned PDFs, or PDFs whose text is locked in compressed
//! streams, give a model nothing to ground on, and a model asked anyway will
//! invent plausible questions. So this crate recovers whatever literal text
//! the file carries, refuses to proceed when that text is too thin or looks
//! like formatting noise, and only then asks an LLM for questions, with a
//! prompt that confines it to the supplied text. Whatever comes back is
//! checked question by question before it reaches the caller.
//!
//! ## Pipeline Overview
//!
//! ```text
//! base64 PDF
//!  │
//!  ├─ 1. Decode    base64 → bytes
//!  ├─ 2. Extract   four literal-string heuristics (CPU-bound, spawn_blocking)
//!  ├─ 3. Normalize strip structural tokens, split glued words
//!  ├─ 4. Validate  ≥ 50 chars and ≥ 10 meaningful words, or stop
//!  ├─ 5. Generate  one bounded, grounded call to gpt-4.1-nano / claude / …
//!  └─ 6. Review    drop malformed questions; fail only if none survive
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2quiz::{generate_quiz, QuizConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = QuizConfig::default();
//!     let payload = std::fs::read_to_string("upload.b64")?;
//!     let output = generate_quiz(&payload, &config).await?;
//!     for q in output.quiz.questions() {
//!         println!("{} → {}", q.question, q.correct_option());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2quiz` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-pdf2quiz = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{QuizConfig, QuizConfigBuilder};
pub use error::{ErrorPayload, QuizError};
pub use generate::{
    extract_document, extract_report, generate_quiz, generate_quiz_from_bytes,
    generate_quiz_from_text, generate_quiz_sync, generate_quiz_to_file, text_report,
    write_quiz_json,
};
pub use output::{ExtractionReport, GenerationStats, QuestionCandidate, QuizOutput, QuizResult};
pub use pipeline::decode::decode_document;
pub use pipeline::extract::ExtractionStrategy;
pub use pipeline::llm::{GenerationRequest, GenerationResponse, LlmTextGenerator, TextGenerator};
pub use pipeline::review::validate_quiz_response;
pub use pipeline::validate::{ValidationThresholds, ValidationVerdict};
pub use progress::{NoopProgressCallback, PipelineStage, ProgressCallback, QuizProgressCallback};
