//! Configuration types for quiz generation.
//!
//! All pipeline behaviour is controlled through [`QuizConfig`], built via its
//! [`QuizConfigBuilder`]. The extraction thresholds and the context budget
//! are ordinary fields rather than constants buried in the pipeline, so tests
//! and callers with unusual document corpora can tune them.

use crate::error::QuizError;
use crate::pipeline::llm::TextGenerator;
use crate::pipeline::validate::ValidationThresholds;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Hard upper bound on `max_context_chars`; larger prompts overrun the
/// context window of the cheap default models.
const MAX_CONTEXT_CEILING: usize = 100_000;

/// Configuration for a quiz-generation run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2quiz::QuizConfig;
///
/// let config = QuizConfig::builder()
///     .question_count(8)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.question_count, 8);
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// Number of questions requested from the service. Default: 5.
    ///
    /// This is a request, not a guarantee: the service may return fewer, and
    /// invalid candidates are dropped by the output validator.
    pub question_count: usize,

    /// Minimum text length and meaningful-word count an extraction must
    /// reach before generation is attempted. Default: 50 chars / 10 words.
    pub thresholds: ValidationThresholds,

    /// Number of characters of extracted text sent to the service. Default: 6000.
    ///
    /// Long documents are cut at exactly this many characters. The prefix of
    /// a document usually carries its framing and definitions, and a fixed
    /// budget keeps per-quiz cost predictable.
    pub max_context_chars: usize,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generator. Takes precedence over every provider setting.
    ///
    /// Used by tests and by callers that front the service with their own
    /// caching or transport.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the service may generate. Default: 4096.
    pub max_tokens: usize,

    /// Timeout for the generation call in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::QUIZ_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Optional stage-level progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: 5,
            thresholds: ValidationThresholds::default(),
            max_context_chars: 6000,
            model: None,
            provider_name: None,
            provider: None,
            generator: None,
            temperature: 0.3,
            max_tokens: 4096,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("question_count", &self.question_count)
            .field("thresholds", &self.thresholds)
            .field("max_context_chars", &self.max_context_chars)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn question_count(mut self, n: usize) -> Self {
        self.config.question_count = n;
        self
    }

    pub fn thresholds(mut self, thresholds: ValidationThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.thresholds.min_chars = n;
        self
    }

    pub fn min_meaningful_words(mut self, n: usize) -> Self {
        self.config.thresholds.min_meaningful_words = n;
        self
    }

    pub fn max_context_chars(mut self, n: usize) -> Self {
        self.config.max_context_chars = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, QuizError> {
        let c = &self.config;
        if c.question_count == 0 {
            return Err(QuizError::InvalidConfig(
                "Question count must be ≥ 1".into(),
            ));
        }
        if c.max_context_chars == 0 || c.max_context_chars > MAX_CONTEXT_CEILING {
            return Err(QuizError::InvalidConfig(format!(
                "Context budget must be 1–{} characters, got {}",
                MAX_CONTEXT_CEILING, c.max_context_chars
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(QuizError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
