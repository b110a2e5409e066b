//! End-to-end integration tests for edgequake-pdf2quiz.
//!
//! Most tests drive the full pipeline with a scripted [`TextGenerator`], so
//! they run offline and deterministically. The live tests at the bottom make
//! real LLM API calls and are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! Live tests:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test e2e live_ -- --nocapture

use async_trait::async_trait;
use base64::Engine;
use edgequake_pdf2quiz::{
    extract_document, generate_quiz, generate_quiz_from_bytes, generate_quiz_from_text,
    generate_quiz_sync, generate_quiz_to_file, GenerationRequest, GenerationResponse,
    PipelineStage, QuizConfig, QuizError, QuizProgressCallback, TextGenerator,
    ValidationThresholds,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A generator that answers every request with a fixed script and records
/// what it was asked.
struct ScriptedGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn replying(content: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(content.into()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn stalling(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(quiz_json(1)),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, QuizError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(content) => Ok(GenerationResponse {
                content: content.clone(),
                input_tokens: 420,
                output_tokens: 180,
            }),
            Err(message) => Err(QuizError::GenerationService {
                message: message.clone(),
            }),
        }
    }
}

/// Route library logs through the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config_with(generator: Arc<ScriptedGenerator>) -> QuizConfig {
    init_tracing();
    QuizConfig::builder()
        .generator(generator as Arc<dyn TextGenerator>)
        .build()
        .unwrap()
}

fn question(n: usize) -> serde_json::Value {
    json!({
        "question": format!("Question {n}: what do plants absorb through their stomata?"),
        "options": ["Oxygen", "Carbon dioxide", "Nitrogen", "Helium"],
        "correct": 1,
        "explanation": "The text says plants absorb carbon dioxide through small pores."
    })
}

fn quiz_json(count: usize) -> String {
    let questions: Vec<_> = (1..=count).map(question).collect();
    json!({ "questions": questions }).to_string()
}

/// An uncompressed single-page PDF whose content stream carries prose.
fn sample_pdf() -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    pdf.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    pdf.extend_from_slice(
        b"3 0 obj << /Type /Page /Parent 2 0 R /Contents 4 0 R \
/Resources << /Font << /F1 5 0 R >> >> >> endobj\n",
    );
    pdf.extend_from_slice(b"4 0 obj << /Length 412 >>\nstream\n");
    pdf.extend_from_slice(
        b"BT /F1 12 Tf 72 720 Td (Photosynthesis converts light energy into chemical energy.) Tj ET\n",
    );
    pdf.extend_from_slice(
        b"BT /F1 12 Tf 72 700 Td (Plants absorb carbon dioxide through small pores called stomata.) Tj ET\n",
    );
    pdf.extend_from_slice(
        b"BT /F1 12 Tf 72 680 Td [(Chlorophyll) -250 (captures) -250 (sunlight) -250 (inside) -250 (leaves.)] TJ ET\n",
    );
    pdf.extend_from_slice(b"endstream\nendobj\n");
    pdf.extend_from_slice(b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n");
    pdf.extend_from_slice(b"trailer << /Root 1 0 R >>\n%%EOF\n");
    pdf
}

/// A PDF whose only literal is far too short to quiz on.
fn thin_pdf() -> Vec<u8> {
    b"%PDF-1.4\n4 0 obj << /Length 40 >>\nstream\nBT /F1 12 Tf (Page one only) Tj ET\nendstream\nendobj\n%%EOF\n"
        .to_vec()
}

fn to_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Progress callback that records every event it receives.
#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl QuizProgressCallback for RecordingCallback {
    fn on_stage_start(&self, stage: PipelineStage) {
        self.events.lock().unwrap().push(format!("start:{stage}"));
    }
    fn on_stage_complete(&self, stage: PipelineStage, _summary: &str) {
        self.events.lock().unwrap().push(format!("done:{stage}"));
    }
    fn on_stage_error(&self, stage: PipelineStage, _error: &str) {
        self.events.lock().unwrap().push(format!("error:{stage}"));
    }
    fn on_pipeline_complete(&self, question_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete:{question_count}"));
    }
}

// ── Full pipeline, scripted generator ────────────────────────────────────────

#[tokio::test]
async fn test_base64_pdf_to_quiz() {
    let generator = ScriptedGenerator::replying(quiz_json(3));
    let config = config_with(Arc::clone(&generator));

    let output = generate_quiz(&to_base64(&sample_pdf()), &config)
        .await
        .expect("pipeline should succeed");

    assert_eq!(output.quiz.len(), 3);
    assert_eq!(output.quiz.questions()[0].correct_option(), "Carbon dioxide");
    assert_eq!(generator.calls(), 1);

    let request = generator.last_request();
    assert!(request.user_prompt.contains("Create 5 multiple-choice questions"));
    assert!(request.user_prompt.contains("Photosynthesis converts light energy"));
    assert!(request.user_prompt.contains("stomata"));
    assert!(request.user_prompt.contains("Chlorophyll captures sunlight"));
    assert!(!request.user_prompt.contains("endobj"));
    assert!(request.system_prompt.contains("ONLY the supplied source text"));

    assert!(output.stats.meaningful_words >= 10);
    assert_eq!(output.stats.candidates_received, 3);
    assert_eq!(output.stats.candidates_accepted, 3);
    assert_eq!(output.stats.input_tokens, 420);
    assert_eq!(output.stats.output_tokens, 180);
    assert!(!output.stats.truncated);
}

#[tokio::test]
async fn test_raw_bytes_entry_point_matches_base64() {
    let generator = ScriptedGenerator::replying(quiz_json(2));
    let config = config_with(Arc::clone(&generator));

    let from_bytes = generate_quiz_from_bytes(sample_pdf(), &config).await.unwrap();
    let bytes_prompt = generator.last_request().user_prompt;
    let from_b64 = generate_quiz(&to_base64(&sample_pdf()), &config).await.unwrap();

    assert_eq!(from_bytes.quiz, from_b64.quiz);
    assert_eq!(bytes_prompt, generator.last_request().user_prompt);
}

#[tokio::test]
async fn test_fenced_response_is_accepted() {
    let fenced = format!("```json\n{}\n```", quiz_json(2));
    let generator = ScriptedGenerator::replying(fenced);
    let output = generate_quiz_from_bytes(sample_pdf(), &config_with(generator))
        .await
        .unwrap();
    assert_eq!(output.quiz.len(), 2);
}

#[tokio::test]
async fn test_partial_batch_keeps_valid_questions() {
    let mut bad = question(2);
    bad["options"] = json!(["a", "b", "c"]);
    let reply = json!({ "questions": [question(1), bad, question(3)] }).to_string();
    let generator = ScriptedGenerator::replying(reply);

    let output = generate_quiz_from_bytes(sample_pdf(), &config_with(generator))
        .await
        .unwrap();
    assert_eq!(output.quiz.len(), 2);
    assert_eq!(output.stats.candidates_received, 3);
    assert_eq!(output.stats.candidates_accepted, 2);
}

#[tokio::test]
async fn test_only_invalid_question_fails() {
    let mut bad = question(1);
    bad["options"] = json!(["a", "b", "c"]);
    let reply = json!({ "questions": [bad] }).to_string();
    let generator = ScriptedGenerator::replying(reply);

    let err = generate_quiz_from_bytes(sample_pdf(), &config_with(generator))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoValidQuestions { received: 1 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_response_fails() {
    let generator = ScriptedGenerator::replying("Sorry, I can't produce a quiz for this.");
    let err = generate_quiz_from_bytes(sample_pdf(), &config_with(generator))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::MalformedResponse { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_service_error_propagates() {
    let generator = ScriptedGenerator::failing("HTTP 503 Service Unavailable");
    let err = generate_quiz_from_bytes(sample_pdf(), &config_with(generator))
        .await
        .unwrap_err();
    match err {
        QuizError::GenerationService { ref message } => assert!(message.contains("503")),
        other => panic!("expected GenerationService, got {other:?}"),
    }
    let payload = err.to_payload();
    assert!(!payload.error.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_service_times_out() {
    let generator = ScriptedGenerator::stalling(Duration::from_secs(600));
    let config = QuizConfig::builder()
        .generator(generator as Arc<dyn TextGenerator>)
        .api_timeout_secs(2)
        .build()
        .unwrap();

    let text = "Glaciers carve valleys as they move. ".repeat(10);
    let err = generate_quiz_from_text(&text, &config).await.unwrap_err();
    match err {
        QuizError::GenerationService { message } => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {other:?}"),
    }
}

// ── Extraction gate: the service is never called ─────────────────────────────

#[tokio::test]
async fn test_thin_pdf_is_rejected_before_generation() {
    let generator = ScriptedGenerator::replying(quiz_json(5));
    let config = config_with(Arc::clone(&generator));

    let err = generate_quiz(&to_base64(&thin_pdf()), &config)
        .await
        .unwrap_err();
    assert!(
        matches!(err, QuizError::InsufficientText { min_chars: 50, .. }),
        "got {err:?}"
    );
    assert!(!err.is_retryable());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_noise_only_pdf_is_low_quality() {
    let mut pdf = b"%PDF-1.4\nstream\n".to_vec();
    for _ in 0..12 {
        pdf.extend_from_slice(b"BT (ABCDEF GHIJKL MNOPQR) Tj ET\n");
    }
    pdf.extend_from_slice(b"endstream\n%%EOF\n");

    let generator = ScriptedGenerator::replying(quiz_json(5));
    let err = generate_quiz_from_bytes(pdf, &config_with(Arc::clone(&generator)))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            QuizError::InsufficientText { .. } | QuizError::LowQualityText { .. }
        ),
        "got {err:?}"
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_bad_base64_is_a_decode_error() {
    let generator = ScriptedGenerator::replying(quiz_json(5));
    let err = generate_quiz("this is *not* base64!", &config_with(Arc::clone(&generator)))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::Decode { .. }));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_extract_document_reports_yield() {
    let report = extract_document(&to_base64(&sample_pdf()), &ValidationThresholds::default())
        .await
        .unwrap();
    assert!(report.verdict.is_valid, "{:?}", report.verdict);
    assert!(report.text.contains("carbon dioxide"));
    let total: usize = report.fragment_counts.iter().map(|(_, n)| n).sum();
    assert!(total >= 3);
}

// ── Context bound ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_long_text_is_truncated_to_context_budget() {
    let generator = ScriptedGenerator::replying(quiz_json(1));
    let config = config_with(Arc::clone(&generator));

    let text = "Rivers carry sediment downstream and deposit it in deltas. ".repeat(200);
    assert!(text.chars().count() > 6000);

    let output = generate_quiz_from_text(&text, &config).await.unwrap();
    assert!(output.stats.truncated);
    assert_eq!(output.stats.context_chars, 6000);

    let prompt = generator.last_request().user_prompt;
    let start = prompt.find("\"\"\"\n").unwrap() + 4;
    let end = prompt.rfind("\n\"\"\"").unwrap();
    assert_eq!(prompt[start..end].chars().count(), 6000);
}

#[tokio::test]
async fn test_question_count_reaches_prompt() {
    let generator = ScriptedGenerator::replying(quiz_json(1));
    let config = QuizConfig::builder()
        .generator(Arc::clone(&generator) as Arc<dyn TextGenerator>)
        .question_count(1)
        .build()
        .unwrap();

    let text = "Volcanoes form where magma rises through weaknesses in the crust. ".repeat(3);
    generate_quiz_from_text(&text, &config).await.unwrap();
    assert!(generator
        .last_request()
        .user_prompt
        .contains("Create 1 multiple-choice question "));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_progress_events_in_stage_order() {
    let recorder = Arc::new(RecordingCallback::default());
    let config = QuizConfig::builder()
        .generator(ScriptedGenerator::replying(quiz_json(2)) as Arc<dyn TextGenerator>)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn QuizProgressCallback>)
        .build()
        .unwrap();

    generate_quiz(&to_base64(&sample_pdf()), &config).await.unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start:decode",
            "done:decode",
            "start:extract",
            "done:extract",
            "start:validate",
            "done:validate",
            "start:generate",
            "done:generate",
            "start:review",
            "done:review",
            "complete:2",
        ]
    );
}

#[tokio::test]
async fn test_progress_reports_failed_stage() {
    let recorder = Arc::new(RecordingCallback::default());
    let config = QuizConfig::builder()
        .generator(ScriptedGenerator::replying(quiz_json(2)) as Arc<dyn TextGenerator>)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn QuizProgressCallback>)
        .build()
        .unwrap();

    let _ = generate_quiz_from_bytes(thin_pdf(), &config).await;

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events.last().map(String::as_str), Some("error:validate"));
    assert!(!events.iter().any(|e| e.starts_with("start:generate")));
}

// ── Sync and file entry points ───────────────────────────────────────────────

#[test]
fn test_sync_wrapper() {
    let config = config_with(ScriptedGenerator::replying(quiz_json(1)));
    let output = generate_quiz_sync(&to_base64(&sample_pdf()), &config).unwrap();
    assert_eq!(output.quiz.len(), 1);
}

#[test]
fn test_text_entry_point_under_block_on() {
    let config = config_with(ScriptedGenerator::replying(quiz_json(1)));
    let text = "Bees pollinate flowers while collecting nectar for their hive. ".repeat(2);
    let output = tokio_test::block_on(generate_quiz_from_text(&text, &config)).unwrap();
    assert_eq!(output.quiz.len(), 1);
    assert_eq!(output.stats.extraction_duration_ms, 0);
}

#[tokio::test]
async fn test_quiz_written_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("quiz.json");
    let config = config_with(ScriptedGenerator::replying(quiz_json(2)));

    let stats = generate_quiz_to_file(&to_base64(&sample_pdf()), &path, &config)
        .await
        .unwrap();
    assert_eq!(stats.candidates_accepted, 2);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["questions"].as_array().unwrap().len(), 2);
    assert_eq!(written["questions"][0]["correct"], 1);
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_output_serialises_with_stats() {
    let config = config_with(ScriptedGenerator::replying(quiz_json(1)));
    let output = generate_quiz_from_bytes(sample_pdf(), &config).await.unwrap();
    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["quiz"]["questions"].as_array().unwrap().len(), 1);
    assert!(value["stats"]["extracted_chars"].as_u64().unwrap() >= 50);
}

// ── Live tests (E2E_ENABLED) ─────────────────────────────────────────────────

/// Full pipeline against a real provider. Requires E2E_ENABLED=1 and an API
/// key that `ProviderFactory` can auto-detect.
#[tokio::test]
async fn live_quiz_from_sample_pdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 and OPENAI_API_KEY to run");
        return;
    }

    let config = QuizConfig::builder()
        .question_count(3)
        .api_timeout_secs(90)
        .build()
        .unwrap();

    let output = generate_quiz(&to_base64(&sample_pdf()), &config)
        .await
        .expect("live generation should succeed");

    assert!(!output.quiz.is_empty());
    for q in output.quiz.questions() {
        assert!(!q.question.trim().is_empty());
        assert!(q.correct_index <= 3);
        assert!(!q.explanation.trim().is_empty());
    }
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

#[tokio::test]
async fn live_unknown_provider_is_not_configured() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }

    let config = QuizConfig::builder()
        .provider_name("no-such-provider")
        .model("no-such-model")
        .build()
        .unwrap();
    let text = "Tides are caused by the gravitational pull of the moon and sun. ".repeat(2);
    let err = generate_quiz_from_text(&text, &config).await.unwrap_err();
    assert!(matches!(err, QuizError::ProviderNotConfigured { .. }), "got {err:?}");
}
