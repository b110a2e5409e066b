//! Heuristic text recovery from a PDF's raw bytes.
//!
//! No object graph is resolved here: no xref table, no font encodings, no
//! stream inflation. Instead four independent strategies scan a lossy UTF-8
//! view of the file for literal string operands, the parenthesised `(...)`
//! spans that uncompressed content streams paint as glyphs. Real prose and
//! structural noise (font names, glyph codes, object markers) look alike at
//! this level, so each strategy keeps only spans whose *shape* resembles
//! words.
//!
//! Strategies only read the shared [`DocumentView`] and return their own
//! fragment list; [`extract_fragments`] concatenates them in
//! [`ExtractionStrategy::ALL`] order. Later strategies re-discover text an
//! earlier one already found. That duplication is tolerated; the validator
//! counts words, it does not care about repeats.

use crate::pipeline::normalize::normalize_text;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A literal string operand with backslash escapes; no nested parentheses.
static RE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\(((?:[^()\\]|\\.)*)\)").unwrap());

static RE_TEXT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\bBT\b(.*?)\bET\b").unwrap());

static RE_SHOW_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\(((?:[^()\\]|\\.)*)\)\s*Tj").unwrap());

static RE_SHOW_TEXT_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[((?:[^\[\]\\]|\\.)*)\]\s*TJ").unwrap());

/// Elements of a `TJ` array: a literal or a numeric kerning adjustment.
static RE_ARRAY_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\(((?:[^()\\]|\\.)*)\)|(-?\d+(?:\.\d+)?)").unwrap());

static RE_ARRAY_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\(((?:[^()\\]|\\.)*)\)\s*\]").unwrap());

static RE_LETTER_RUN_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}{3,}").unwrap());
static RE_LETTER_RUN_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}{2,}").unwrap());
static RE_CAPS_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{10,}$").unwrap());

/// Kerning offsets at or below this (in thousandths of an em) are word gaps.
const WORD_GAP_KERNING: f64 = -200.0;

/// Read-only view of the document shared by every strategy.
#[derive(Debug, Clone)]
pub struct DocumentView {
    text: String,
}

impl DocumentView {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// The heuristic used to recover a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Every `(...)` literal anywhere in the file, strictly filtered.
    ParentheticalLiteral,
    /// Literals inside `BT … ET` text objects, loosely filtered.
    TextBlock,
    /// Literals painted by `Tj`, and `[...] TJ` arrays joined into one string.
    ShowText,
    /// A single literal wrapped in brackets, `[(...)]`.
    ArrayLiteral,
}

impl ExtractionStrategy {
    /// All strategies, in merge order.
    pub const ALL: [ExtractionStrategy; 4] = [
        ExtractionStrategy::ParentheticalLiteral,
        ExtractionStrategy::TextBlock,
        ExtractionStrategy::ShowText,
        ExtractionStrategy::ArrayLiteral,
    ];

    /// Run this strategy over the document.
    pub fn extract(&self, view: &DocumentView) -> Vec<TextFragment> {
        let texts = match self {
            ExtractionStrategy::ParentheticalLiteral => parenthetical_literals(view.as_str()),
            ExtractionStrategy::TextBlock => text_blocks(view.as_str()),
            ExtractionStrategy::ShowText => show_text(view.as_str()),
            ExtractionStrategy::ArrayLiteral => array_literals(view.as_str()),
        };
        texts
            .into_iter()
            .map(|text| TextFragment {
                text,
                strategy: *self,
            })
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionStrategy::ParentheticalLiteral => "parenthetical-literal",
            ExtractionStrategy::TextBlock => "text-block",
            ExtractionStrategy::ShowText => "show-text",
            ExtractionStrategy::ArrayLiteral => "array-literal",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate span of recovered text and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    pub strategy: ExtractionStrategy,
}

/// Normalised text recovered from a document, with per-strategy yield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    pub fragment_counts: Vec<(ExtractionStrategy, usize)>,
}

/// Run every strategy over the raw bytes, in merge order.
pub fn extract_fragments(bytes: &[u8]) -> Vec<TextFragment> {
    let view = DocumentView::new(bytes);
    ExtractionStrategy::ALL
        .iter()
        .flat_map(|strategy| strategy.extract(&view))
        .collect()
}

/// Join fragments into one blob, separated by single spaces.
pub fn merge_fragments(fragments: &[TextFragment]) -> String {
    let mut merged = String::new();
    for fragment in fragments {
        if !merged.is_empty() {
            merged.push(' ');
        }
        merged.push_str(&fragment.text);
    }
    merged
}

/// Recover and normalise the text of a document.
pub fn extract_text(bytes: &[u8]) -> Extraction {
    let fragments = extract_fragments(bytes);
    let fragment_counts = ExtractionStrategy::ALL
        .iter()
        .map(|s| (*s, fragments.iter().filter(|f| f.strategy == *s).count()))
        .collect::<Vec<_>>();

    for (strategy, n) in &fragment_counts {
        debug!("Strategy {}: {} fragments", strategy, n);
    }

    let text = normalize_text(&merge_fragments(&fragments));
    Extraction {
        text,
        fragment_counts,
    }
}

// ── Strategy 1: parenthetical literals ───────────────────────────────────────

fn parenthetical_literals(doc: &str) -> Vec<String> {
    RE_LITERAL
        .captures_iter(doc)
        .map(|caps| unescape_literal(&caps[1]))
        .filter(|s| accept_strict(s))
        .collect()
}

fn accept_strict(raw: &str) -> bool {
    let s = raw.trim();
    s.chars().count() > 5
        && RE_LETTER_RUN_3.is_match(s)
        && s.split_whitespace().count() >= 2
        && !RE_CAPS_DIGIT_RUN.is_match(s)
        && !s.contains("obj")
        && s.chars().any(char::is_alphabetic)
}

// ── Strategy 2: BT … ET text blocks ──────────────────────────────────────────

fn text_blocks(doc: &str) -> Vec<String> {
    RE_TEXT_BLOCK
        .captures_iter(doc)
        .flat_map(|block| {
            RE_LITERAL
                .captures_iter(block.get(1).map_or("", |m| m.as_str()))
                .map(|caps| unescape_literal(&caps[1]))
                .filter(|s| accept_loose(s))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn accept_loose(raw: &str) -> bool {
    let s = raw.trim();
    s.chars().count() > 3
        && s.chars().any(char::is_alphabetic)
        && !s
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

// ── Strategy 3: Tj / TJ show-text operators ─────────────────────────────────

fn show_text(doc: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = RE_SHOW_TEXT
        .captures_iter(doc)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            Some((m.start(), unescape_literal(&caps[1])))
        })
        .collect();

    found.extend(RE_SHOW_TEXT_ARRAY.captures_iter(doc).filter_map(|caps| {
        let m = caps.get(0)?;
        Some((m.start(), join_tj_array(&caps[1])))
    }));

    // Keep document order across the two operator forms.
    found.sort_by_key(|(pos, _)| *pos);
    found
        .into_iter()
        .map(|(_, s)| s)
        .filter(|s| accept_letters(s))
        .collect()
}

/// Concatenate the literals of a `TJ` array, turning wide negative kerning
/// into a space.
fn join_tj_array(inner: &str) -> String {
    let mut out = String::new();
    for caps in RE_ARRAY_ELEMENT.captures_iter(inner) {
        if let Some(lit) = caps.get(1) {
            out.push_str(&unescape_literal(lit.as_str()));
        } else if let Some(num) = caps.get(2) {
            let gap = num.as_str().parse::<f64>().unwrap_or(0.0);
            if gap <= WORD_GAP_KERNING && !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        }
    }
    out
}

fn accept_letters(raw: &str) -> bool {
    let s = raw.trim();
    s.chars().count() > 3 && RE_LETTER_RUN_2.is_match(s)
}

// ── Strategy 4: single bracketed literal ────────────────────────────────────

fn array_literals(doc: &str) -> Vec<String> {
    RE_ARRAY_LITERAL
        .captures_iter(doc)
        .map(|caps| unescape_literal(&caps[1]))
        .filter(|s| accept_letters(s))
        .collect()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Undo the literal-string escapes `\n \r \t \( \) \\`.
///
/// Other escapes (octal codes, line continuations) are left as written.
fn unescape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('r') => {
                out.push('\r');
                chars.next();
            }
            Some('t') => {
                out.push('\t');
                chars.next();
            }
            Some(c @ ('(' | ')' | '\\')) => {
                out.push(c);
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}
