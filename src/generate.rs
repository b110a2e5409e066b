//! Eager quiz-generation entry points.
//!
//! Every entry point runs the same strictly forward pipeline and differs only
//! in where it joins it:
//!
//! | Entry point | Starts at |
//! |-------------|-----------|
//! | [`generate_quiz`] | base64 payload (decode) |
//! | [`generate_quiz_from_bytes`] | raw PDF bytes (extract) |
//! | [`generate_quiz_from_text`] | plain text (validate) |
//!
//! [`extract_document`] runs only the LLM-free stages and reports what was
//! recovered, which is what a caller needs to explain a rejected upload.

use crate::config::QuizConfig;
use crate::error::QuizError;
use crate::output::{ExtractionReport, GenerationStats, QuizOutput};
use crate::pipeline::decode::decode_document;
use crate::pipeline::extract::{extract_text, Extraction};
use crate::pipeline::llm::{build_request, request_quiz, LlmTextGenerator, TextGenerator};
use crate::pipeline::response::parse_candidates;
use crate::pipeline::review::review_candidates;
use crate::pipeline::validate::{validate_text, ValidationThresholds, ValidationVerdict};
use crate::progress::{PipelineStage, ProgressCallback};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a quiz from a base64-encoded document.
///
/// # Errors
/// - [`QuizError::Decode`] — the payload is not base64
/// - [`QuizError::InsufficientText`] / [`QuizError::LowQualityText`] — the
///   document has no usable text layer
/// - [`QuizError::GenerationService`] / [`QuizError::MalformedResponse`] /
///   [`QuizError::NoValidQuestions`] — the service failed (retryable)
pub async fn generate_quiz(payload: &str, config: &QuizConfig) -> Result<QuizOutput, QuizError> {
    let total_start = Instant::now();
    let reporter = StageReporter::new(config.progress_callback.as_ref());
    info!("Starting quiz generation from {} base64 chars", payload.len());

    // ── Step 1: Decode ───────────────────────────────────────────────────
    reporter.start(PipelineStage::Decode);
    let bytes = reporter.track(PipelineStage::Decode, decode_document(payload))?;
    reporter.complete(PipelineStage::Decode, &format!("{} bytes", bytes.len()));

    run_from_bytes(bytes, config, &reporter, total_start).await
}

/// Generate a quiz from raw PDF bytes.
pub async fn generate_quiz_from_bytes(
    bytes: Vec<u8>,
    config: &QuizConfig,
) -> Result<QuizOutput, QuizError> {
    let total_start = Instant::now();
    let reporter = StageReporter::new(config.progress_callback.as_ref());
    info!("Starting quiz generation from {} PDF bytes", bytes.len());
    run_from_bytes(bytes, config, &reporter, total_start).await
}

/// Generate a quiz from plain text, skipping PDF extraction.
///
/// Whitespace is collapsed but no PDF-specific denoising is applied; the
/// text still has to pass the extraction validator.
pub async fn generate_quiz_from_text(
    text: &str,
    config: &QuizConfig,
) -> Result<QuizOutput, QuizError> {
    let total_start = Instant::now();
    let reporter = StageReporter::new(config.progress_callback.as_ref());
    let text = collapse_plain_text(text);
    info!("Starting quiz generation from {} chars of text", text.len());

    let verdict = run_validation(&text, &config.thresholds, &reporter)?;
    let stats = GenerationStats {
        extracted_chars: verdict.char_count,
        meaningful_words: verdict.meaningful_word_count,
        ..Default::default()
    };
    run_generation(&text, config, &reporter, stats, total_start).await
}

/// Synchronous wrapper around [`generate_quiz`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_quiz_sync(payload: &str, config: &QuizConfig) -> Result<QuizOutput, QuizError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_quiz(payload, config))
}

/// Generate a quiz and write it as pretty JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_quiz_to_file(
    payload: &str,
    output_path: impl AsRef<Path>,
    config: &QuizConfig,
) -> Result<GenerationStats, QuizError> {
    let output = generate_quiz(payload, config).await?;
    write_quiz_json(&output, output_path.as_ref()).await?;
    Ok(output.stats)
}

/// Run decode, extraction and validation only. Never calls the service.
///
/// Returns a report even when the verdict is negative; only a decode failure
/// is an error.
pub async fn extract_document(
    payload: &str,
    thresholds: &ValidationThresholds,
) -> Result<ExtractionReport, QuizError> {
    let bytes = decode_document(payload)?;
    let thresholds = *thresholds;
    tokio::task::spawn_blocking(move || extract_report(&bytes, &thresholds))
        .await
        .map_err(|e| QuizError::Internal(format!("Extraction task panicked: {}", e)))
}

/// Blocking extraction report over raw bytes.
pub fn extract_report(bytes: &[u8], thresholds: &ValidationThresholds) -> ExtractionReport {
    let Extraction {
        text,
        fragment_counts,
    } = extract_text(bytes);
    let verdict = validate_text(&text, thresholds);
    ExtractionReport {
        text,
        verdict,
        fragment_counts,
    }
}

/// Extraction report for plain text, judged exactly as
/// [`generate_quiz_from_text`] would judge it. `fragment_counts` is empty.
pub fn text_report(text: &str, thresholds: &ValidationThresholds) -> ExtractionReport {
    let text = collapse_plain_text(text);
    let verdict = validate_text(&text, thresholds);
    ExtractionReport {
        text,
        verdict,
        fragment_counts: Vec::new(),
    }
}

/// Write a quiz as pretty JSON, atomically.
pub async fn write_quiz_json(output: &QuizOutput, path: &Path) -> Result<(), QuizError> {
    let json = serde_json::to_string_pretty(&output.quiz)
        .map_err(|e| QuizError::Internal(format!("Failed to serialise quiz: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| QuizError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| QuizError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| QuizError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn collapse_plain_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn run_from_bytes(
    bytes: Vec<u8>,
    config: &QuizConfig,
    reporter: &StageReporter<'_>,
    total_start: Instant,
) -> Result<QuizOutput, QuizError> {
    // ── Step 2–3: Extract + normalise ────────────────────────────────────
    reporter.start(PipelineStage::Extract);
    let extraction_start = Instant::now();
    let extraction = reporter.track(
        PipelineStage::Extract,
        tokio::task::spawn_blocking(move || extract_text(&bytes))
            .await
            .map_err(|e| QuizError::Internal(format!("Extraction task panicked: {}", e))),
    )?;
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
    let fragments: usize = extraction.fragment_counts.iter().map(|(_, n)| n).sum();
    info!(
        "Extracted {} chars from {} fragments in {}ms",
        extraction.text.len(),
        fragments,
        extraction_duration_ms
    );
    reporter.complete(
        PipelineStage::Extract,
        &format!("{} fragments", fragments),
    );

    // ── Step 4: Validate ─────────────────────────────────────────────────
    let verdict = run_validation(&extraction.text, &config.thresholds, reporter)?;

    let stats = GenerationStats {
        extracted_chars: verdict.char_count,
        meaningful_words: verdict.meaningful_word_count,
        extraction_duration_ms,
        ..Default::default()
    };
    run_generation(&extraction.text, config, reporter, stats, total_start).await
}

fn run_validation(
    text: &str,
    thresholds: &ValidationThresholds,
    reporter: &StageReporter<'_>,
) -> Result<ValidationVerdict, QuizError> {
    reporter.start(PipelineStage::Validate);
    let verdict = reporter.track(
        PipelineStage::Validate,
        validate_text(text, thresholds).into_result(),
    )?;
    reporter.complete(
        PipelineStage::Validate,
        &format!(
            "{} chars, {} meaningful words",
            verdict.char_count, verdict.meaningful_word_count
        ),
    );
    Ok(verdict)
}

async fn run_generation(
    text: &str,
    config: &QuizConfig,
    reporter: &StageReporter<'_>,
    mut stats: GenerationStats,
    total_start: Instant,
) -> Result<QuizOutput, QuizError> {
    // ── Step 5: Generate ─────────────────────────────────────────────────
    reporter.start(PipelineStage::Generate);
    let generator = reporter.track(PipelineStage::Generate, resolve_generator(config))?;
    let (request, truncated) = build_request(text, config);
    stats.truncated = truncated;
    stats.context_chars = text.chars().count().min(config.max_context_chars);

    let llm_start = Instant::now();
    let response = reporter.track(
        PipelineStage::Generate,
        request_quiz(&generator, &request, config.api_timeout_secs).await,
    )?;
    stats.llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    stats.input_tokens = response.input_tokens;
    stats.output_tokens = response.output_tokens;
    reporter.complete(
        PipelineStage::Generate,
        &format!("{} chars in {}ms", response.content.len(), stats.llm_duration_ms),
    );

    // ── Step 6: Review ───────────────────────────────────────────────────
    reporter.start(PipelineStage::Review);
    let candidates = reporter.track(PipelineStage::Review, parse_candidates(&response.content))?;
    stats.candidates_received = candidates.len();
    let quiz = reporter.track(PipelineStage::Review, review_candidates(candidates))?;
    stats.candidates_accepted = quiz.len();
    reporter.complete(
        PipelineStage::Review,
        &format!(
            "{}/{} questions accepted",
            stats.candidates_accepted, stats.candidates_received
        ),
    );

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Quiz complete: {} questions, {}ms total",
        quiz.len(),
        stats.total_duration_ms
    );
    if let Some(cb) = reporter.callback {
        cb.on_pipeline_complete(quiz.len());
    }

    Ok(QuizOutput { quiz, stats })
}

/// Forwards stage events to the optional progress callback.
struct StageReporter<'a> {
    callback: Option<&'a ProgressCallback>,
}

impl<'a> StageReporter<'a> {
    fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self { callback }
    }

    fn start(&self, stage: PipelineStage) {
        debug!("Stage {} started", stage);
        if let Some(cb) = self.callback {
            cb.on_stage_start(stage);
        }
    }

    fn complete(&self, stage: PipelineStage, summary: &str) {
        debug!("Stage {} complete: {}", stage, summary);
        if let Some(cb) = self.callback {
            cb.on_stage_complete(stage, summary);
        }
    }

    /// Report a failed stage before handing the result back.
    fn track<T>(&self, stage: PipelineStage, result: Result<T, QuizError>) -> Result<T, QuizError> {
        if let Err(ref e) = result {
            info!("Stage {} failed: {}", stage, e);
            if let Some(cb) = self.callback {
                cb.on_stage_error(stage, &e.to_string());
            }
        }
        result
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, QuizError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        QuizError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the generator, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.generator`), used as-is.
/// 2. **Pre-built provider** (`config.provider`), wrapped in [`LlmTextGenerator`].
/// 3. **Named provider + model** (`config.provider_name`).
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **OpenAI key** (`OPENAI_API_KEY`) with the configured or default model.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_generator(config: &QuizConfig) -> Result<Arc<dyn TextGenerator>, QuizError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }
    resolve_provider(config).map(|p| Arc::new(LlmTextGenerator::new(p)) as Arc<dyn TextGenerator>)
}

fn resolve_provider(config: &QuizConfig) -> Result<Arc<dyn LLMProvider>, QuizError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| QuizError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

const DEFAULT_MODEL: &str = "gpt-4.1-nano";
