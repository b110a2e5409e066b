//! CLI binary for edgequake-pdf2quiz.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `QuizConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2quiz::pipeline::input::{load_document, DocumentKind};
use edgequake_pdf2quiz::{
    extract_report, generate_quiz, generate_quiz_from_bytes, generate_quiz_from_text,
    text_report, write_quiz_json, ExtractionReport, PipelineStage, ProgressCallback, QuizConfig,
    QuizError, QuizOutput, QuizProgressCallback, ValidationThresholds,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner, one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn stage_elapsed(&self) -> String {
        let ms = self
            .stage_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

impl QuizProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: PipelineStage) {
        if let Ok(mut started) = self.stage_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_prefix(stage.label());
        self.bar.set_message(match stage {
            PipelineStage::Generate => "waiting for the model…",
            _ => "",
        });
    }

    fn on_stage_complete(&self, stage: PipelineStage, summary: &str) {
        self.bar.println(format!(
            "  {} {:<9} {}  {}",
            green("✓"),
            stage.label(),
            dim(summary),
            dim(&self.stage_elapsed()),
        ));
    }

    fn on_stage_error(&self, stage: PipelineStage, error: &str) {
        // Keep only the first line; the full error is printed on exit.
        let first = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:<9} {}  {}",
            red("✗"),
            stage.label(),
            red(first),
            dim(&self.stage_elapsed()),
        ));
        self.bar.finish_and_clear();
    }

    fn on_pipeline_complete(&self, question_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} questions generated",
            green("✔"),
            bold(&question_count.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Five questions from a local PDF (stdout)
  pdf2quiz lecture.pdf

  # Ten questions, written as JSON to a file
  pdf2quiz -n 10 lecture.pdf -o quiz.json

  # Input that is already base64 (e.g. a browser upload saved to disk)
  pdf2quiz upload.b64

  # Plain-text notes skip PDF extraction
  pdf2quiz notes.txt

  # Check whether a PDF has a usable text layer (no API key needed)
  pdf2quiz --extract-only scan.pdf

  # Use a specific model
  pdf2quiz --model gpt-4.1-mini --provider openai lecture.pdf

  # Machine-readable output, including {"error", "details"} on failure
  pdf2quiz --json lecture.pdf > result.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID

LIMITATIONS:
  Text is recovered from uncompressed content streams only. Scanned PDFs and
  most PDFs produced by modern office suites (Flate-compressed streams) yield
  too little text and are rejected before any model call is made.
"#;

/// Generate grounded multiple-choice quizzes from PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2quiz",
    version,
    about = "Generate grounded multiple-choice quizzes from PDF documents",
    long_about = "Recover the text of a PDF (local file, base64 file, or URL), check that it is \
usable, and ask an LLM for multiple-choice questions answerable from that text alone. Supports \
OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path (PDF, base64 PDF, or text) or HTTP/HTTPS URL.
    input: String,

    /// Write the quiz JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2QUIZ_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of questions to request (1–20).
    #[arg(short = 'n', long = "questions", env = "PDF2QUIZ_QUESTIONS", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..=20))]
    questions: u32,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Characters of extracted text sent to the model.
    #[arg(long, env = "PDF2QUIZ_MAX_CONTEXT_CHARS", default_value_t = 6000)]
    max_context_chars: usize,

    /// Minimum extracted characters before generation is attempted.
    #[arg(long, env = "PDF2QUIZ_MIN_CHARS", default_value_t = 50)]
    min_chars: usize,

    /// Minimum meaningful words before generation is attempted.
    #[arg(long, env = "PDF2QUIZ_MIN_WORDS", default_value_t = 10)]
    min_words: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2QUIZ_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PDF2QUIZ_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDF2QUIZ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2QUIZ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2QUIZ_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output structured JSON (quiz + stats, or error payload).
    #[arg(long, env = "PDF2QUIZ_JSON")]
    json: bool,

    /// Run extraction and validation only; print what was recovered.
    #[arg(long)]
    extract_only: bool,

    /// Disable progress spinner.
    #[arg(long, env = "PDF2QUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2QUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2QUIZ_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports each stage, so library INFO logs are
    // suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if cli.json {
                if let Some(quiz_err) = err.downcast_ref::<QuizError>() {
                    if let Ok(json) = serde_json::to_string_pretty(&quiz_err.to_payload()) {
                        println!("{json}");
                    }
                }
            }
            eprintln!("{} {:#}", red("Error:"), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress && !cli.extract_only {
        Some(CliProgressCallback::new() as Arc<dyn QuizProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb).await?;

    let document = load_document(&cli.input, cli.download_timeout).await?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let thresholds = config.thresholds;
        let bytes = match document.kind {
            DocumentKind::Text => {
                let text = String::from_utf8_lossy(&document.bytes);
                print_report(&text_report(&text, &thresholds), cli.json)?;
                return Ok(());
            }
            DocumentKind::Base64Pdf => {
                let text = String::from_utf8_lossy(&document.bytes);
                edgequake_pdf2quiz::decode_document(&text)?
            }
            DocumentKind::Pdf => document.bytes,
        };
        let report = tokio::task::spawn_blocking(move || extract_report(&bytes, &thresholds))
            .await
            .context("Extraction task failed")?;
        print_report(&report, cli.json)?;
        return Ok(());
    }

    // ── Run generation ───────────────────────────────────────────────────
    let output = match document.kind {
        DocumentKind::Pdf => generate_quiz_from_bytes(document.bytes, &config).await?,
        DocumentKind::Base64Pdf => {
            let payload = String::from_utf8_lossy(&document.bytes);
            generate_quiz(&payload, &config).await?
        }
        DocumentKind::Text => {
            let text = String::from_utf8_lossy(&document.bytes);
            generate_quiz_from_text(&text, &config).await?
        }
    };

    if let Some(ref output_path) = cli.output {
        write_quiz_json(&output, output_path).await?;
        if !cli.quiet {
            eprintln!(
                "{}  {} questions  {}ms  →  {}",
                green("✔"),
                output.quiz.len(),
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_quiz(&output);
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {} of {} candidates kept{}",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.candidates_accepted,
            output.stats.candidates_received,
            if output.stats.truncated {
                dim("  (source truncated)")
            } else {
                String::new()
            },
        );
    }

    Ok(())
}

/// Map CLI args to `QuizConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<QuizConfig> {
    let mut builder = QuizConfig::builder()
        .question_count(cli.questions as usize)
        .thresholds(ValidationThresholds {
            min_chars: cli.min_chars,
            min_meaningful_words: cli.min_words,
        })
        .max_context_chars(cli.max_context_chars)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}

fn print_quiz(output: &QuizOutput) {
    const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];
    for (i, q) in output.quiz.questions().iter().enumerate() {
        println!("{}. {}", i + 1, bold(&q.question));
        for (j, option) in q.options.iter().enumerate() {
            let line = format!("   {}) {}", LETTERS[j], option);
            if j == q.correct_index {
                println!("{}", green(&line));
            } else {
                println!("{line}");
            }
        }
        println!("   {}", dim(&q.explanation));
        println!();
    }
}

fn print_report(report: &ExtractionReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialise report")?
        );
        return Ok(());
    }

    println!(
        "Usable:            {}",
        if report.verdict.is_valid {
            green("yes")
        } else {
            red("no")
        }
    );
    if let Some(ref reason) = report.verdict.reason {
        println!("Reason:            {}", reason);
    }
    println!("Characters:        {}", report.verdict.char_count);
    println!("Meaningful words:  {}", report.verdict.meaningful_word_count);
    for (strategy, count) in &report.fragment_counts {
        println!("  {:<22} {} fragments", strategy.label(), count);
    }
    if !report.text.is_empty() {
        let preview: String = report.text.chars().take(400).collect();
        println!();
        println!("{}", dim(&preview));
    }
    Ok(())
}
