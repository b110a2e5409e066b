//! Prompts for grounded quiz generation.
//!
//! Every prompt lives here so that a change to the grounding rules or the
//! output contract is a one-file edit, and so tests can inspect the exact text
//! sent to the service. Callers can override the system prompt via
//! [`crate::config::QuizConfig::system_prompt`]; the user prompt always comes
//! from [`quiz_user_prompt`] because it carries the source text.

/// Default system prompt for generating a quiz from supplied text.
///
/// The JSON shape described here is the one [`crate::pipeline::response`]
/// parses and [`crate::pipeline::review`] validates.
pub const QUIZ_SYSTEM_PROMPT: &str = r#"You are an assessment writer. You create multiple-choice quiz questions about a source text supplied by the user.

Follow these rules precisely:

1. GROUNDING
   - Every question MUST be answerable using ONLY the supplied source text
   - Do NOT use general knowledge, outside facts, or assumptions
   - Do NOT ask about anything the text does not state
   - If the text is short, ask fewer questions rather than inventing content

2. QUESTIONS
   - Each question has exactly 4 answer options
   - Exactly one option is correct
   - Distractors must be plausible but clearly wrong according to the text
   - Do not repeat questions or test the same fact twice

3. EXPLANATIONS
   - Each question includes a one- or two-sentence explanation
   - The explanation cites what the source text says

4. OUTPUT FORMAT
   - Output ONLY a JSON object, no commentary and no markdown fences
   - Use exactly this shape:
     {"questions": [{"question": "...", "options": ["...", "...", "...", "..."], "correct": 0, "explanation": "..."}]}
   - "correct" is the 0-based index (0, 1, 2 or 3) of the correct option"#;

/// Build the user message carrying the question count and the source text.
///
/// `source_text` must already be truncated to the context budget.
pub fn quiz_user_prompt(source_text: &str, question_count: usize) -> String {
    let noun = if question_count == 1 { "question" } else { "questions" };
    format!(
        "Create {question_count} multiple-choice {noun} using ONLY the source text below.\n\
Return the JSON object described in your instructions.\n\n\
SOURCE TEXT:\n\"\"\"\n{source_text}\n\"\"\""
    )
}
