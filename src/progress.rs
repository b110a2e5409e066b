//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn QuizProgressCallback>`] via
//! [`crate::config::QuizConfigBuilder::progress_callback`] to receive an event
//! as each stage of the pipeline starts, completes, or fails. The CLI uses it
//! to drive a spinner; servers can forward events to a WebSocket or a job
//! record without the library knowing how the host communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2quiz::{PipelineStage, QuizConfig, QuizProgressCallback};
//! use std::sync::Arc;
//!
//! struct StderrLog;
//!
//! impl QuizProgressCallback for StderrLog {
//!     fn on_stage_complete(&self, stage: PipelineStage, summary: &str) {
//!         eprintln!("{stage}: {summary}");
//!     }
//! }
//!
//! let config = QuizConfig::builder()
//!     .progress_callback(Arc::new(StderrLog) as Arc<dyn QuizProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The stages of the quiz pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// base64 payload → raw bytes
    Decode,
    /// heuristic content-stream extraction and normalisation
    Extract,
    /// text length / meaningful-word judgement
    Validate,
    /// call to the text-generation service
    Generate,
    /// response parsing and per-question structural filtering
    Review,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Decode => "decode",
            PipelineStage::Extract => "extract",
            PipelineStage::Validate => "validate",
            PipelineStage::Generate => "generate",
            PipelineStage::Review => "review",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: the pipeline
/// future may resume on any runtime worker thread.
pub trait QuizProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// `summary` is a short human-readable description of the stage output,
    /// e.g. `"2431 chars, 388 meaningful words"`.
    fn on_stage_complete(&self, stage: PipelineStage, summary: &str) {
        let _ = (stage, summary);
    }

    /// Called when a stage fails; the error is returned to the caller afterwards.
    fn on_stage_error(&self, stage: PipelineStage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the quiz has been accepted.
    fn on_pipeline_complete(&self, question_count: usize) {
        let _ = question_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl QuizProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::QuizConfig`].
pub type ProgressCallback = Arc<dyn QuizProgressCallback>;
