//! Grounded generation: build the bounded request and call the service.
//!
//! The service is reached through the [`TextGenerator`] trait. The production
//! implementation, [`LlmTextGenerator`], wraps an `edgequake_llm` provider;
//! tests and embedding applications can supply their own. All prompt wording
//! lives in [`crate::prompts`].
//!
//! This is the only stage with network I/O. The call runs under the
//! configured timeout, and every failure (transport, non-success, timeout)
//! is surfaced as [`QuizError::GenerationService`]. There is no retry loop
//! here; a caller that wants retries re-runs the whole pipeline.

use crate::config::QuizConfig;
use crate::error::QuizError;
use crate::prompts::{quiz_user_prompt, QUIZ_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// A fully built request for the text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// The raw text the service answered with, plus token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Anything that can turn a [`GenerationRequest`] into raw response text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, QuizError>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` provider.
pub struct LlmTextGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, QuizError> {
        let messages = vec![
            ChatMessage::system(request.system_prompt.as_str()),
            ChatMessage::user(request.user_prompt.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| QuizError::GenerationService {
                message: e.to_string(),
            })?;

        Ok(GenerationResponse {
            content: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Keep exactly the first `max_chars` characters of `text`.
///
/// Returns the (possibly shortened) slice and whether anything was cut.
/// Cuts on a character boundary, never inside a UTF-8 sequence.
pub fn truncate_context(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Build the generation request for already-validated source text.
pub fn build_request(source_text: &str, config: &QuizConfig) -> (GenerationRequest, bool) {
    let (context, truncated) = truncate_context(source_text, config.max_context_chars);
    if truncated {
        debug!(
            "Source text truncated to {} characters for the prompt",
            config.max_context_chars
        );
    }
    let system_prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| QUIZ_SYSTEM_PROMPT.to_string());

    let request = GenerationRequest {
        system_prompt,
        user_prompt: quiz_user_prompt(context, config.question_count),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };
    (request, truncated)
}

/// Submit a request under the configured timeout.
pub async fn request_quiz(
    generator: &Arc<dyn TextGenerator>,
    request: &GenerationRequest,
    timeout_secs: u64,
) -> Result<GenerationResponse, QuizError> {
    let start = Instant::now();

    let response = match timeout(Duration::from_secs(timeout_secs), generator.generate(request)).await
    {
        Ok(result) => result?,
        Err(_) => {
            warn!("Generation call timed out after {}s", timeout_secs);
            return Err(QuizError::GenerationService {
                message: format!("request timed out after {}s", timeout_secs),
            });
        }
    };

    debug!(
        "Generation: {} input tokens, {} output tokens, {:?}",
        response.input_tokens,
        response.output_tokens,
        start.elapsed()
    );

    if response.content.trim().is_empty() {
        return Err(QuizError::MalformedResponse {
            detail: "service returned an empty response".into(),
        });
    }
    Ok(response)
}
