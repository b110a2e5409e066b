//! Pipeline stages for document-to-quiz generation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and data only ever flows forward.
//!
//! ## Data Flow
//!
//! ```text
//! decode ──▶ extract ──▶ normalize ──▶ validate ──▶ llm ──▶ response ──▶ review
//! (base64)   (4 heuristics) (denoise)   (gate)      (LLM)   (unwrap)     (filter)
//! ```
//!
//! 1. [`decode`]    — base64 payload to raw bytes
//! 2. [`extract`]   — four independent literal-string heuristics over the bytes
//! 3. [`normalize`] — strip structural artefacts, re-segment glued tokens
//! 4. [`validate`]  — reject text that is too short or not word-like
//! 5. [`llm`]       — bounded, grounded prompt; the only stage with network I/O
//! 6. [`response`]  — strip code fences and parse the JSON envelope
//! 7. [`review`]    — drop structurally invalid questions; fail if none remain
//!
//! [`input`] sits outside the flow: it loads paths and URLs for callers that
//! do not already hold a payload.

pub mod decode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod response;
pub mod review;
pub mod validate;
