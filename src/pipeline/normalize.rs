//! Best-effort denoising of heuristically extracted text.
//!
//! The extractor hands over prose interleaved with glyph runs, operator
//! operands and object markers. The rules below remove the most common
//! artefacts without trying to be a real layout engine; the validator
//! downstream exists because this stage can still leave garbage.
//!
//! A single pass is not always a fixed point: deleting a structural token can
//! expose a fresh artefact (`1 2 TT1 3` becomes the triple `1 2 3`). The pass
//! is therefore repeated until the text stops changing, so that
//! `normalize_text(normalize_text(x)) == normalize_text(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_CAMEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{Ll})(\p{Lu})").unwrap());
static RE_CAPS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Lu}{5,}").unwrap());
static RE_DIGIT_TRIPLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\b").unwrap()
});
static RE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\p{L}\p{N}\s.,;:!?'"()\-]"#).unwrap());
static RE_OBJECT_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\s+\d+\s+(?:obj|R)\b").unwrap());
/// Resource names: `F1`, `F12` (fonts) and two-capital tags such as `TT1`,
/// `GS0`, `CS2`. Other single capitals (`B12`, `T4`) are content.
static RE_FONT_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:F\d+|[A-Z]{2}\d+)\b").unwrap());
static RE_STRUCTURAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:endstream|stream|endobj|obj|startxref|xref|trailer|EOF)\b").unwrap()
});

/// Upper bound on repeated passes; real input settles in two or three.
const MAX_PASSES: usize = 8;

/// Normalise extracted text until it reaches a fixed point.
pub fn normalize_text(input: &str) -> String {
    let mut current = normalize_pass(input);
    for _ in 1..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// One ordered application of every cleanup rule.
fn normalize_pass(input: &str) -> String {
    let s = collapse_whitespace(input);
    let s = RE_CAMEL.replace_all(&s, "$1 $2");
    let s = RE_CAPS_RUN.replace_all(&s, "");
    let s = RE_DIGIT_TRIPLE.replace_all(&s, "");
    let s = RE_DISALLOWED.replace_all(&s, " ");
    let s = collapse_whitespace(&s);
    let s = strip_structural_tokens(&s);
    collapse_whitespace(&s).trim().to_string()
}

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

fn strip_structural_tokens(input: &str) -> String {
    // `N N obj` must go before the bare `obj` token, or its numbers survive.
    let s = RE_OBJECT_REF.replace_all(input, "");
    let s = RE_FONT_REF.replace_all(&s, "");
    RE_STRUCTURAL.replace_all(&s, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(normalize_text("  Hello   world\n\tagain  "), "Hello world again");
    }

    #[test]
    fn splits_camel_case_glue() {
        assert_eq!(
            normalize_text("photosynthesisConverts lightEnergy"),
            "photosynthesis Converts light Energy"
        );
    }

    #[test]
    fn removes_long_uppercase_runs() {
        assert_eq!(normalize_text("The NASAAGENCY launched"), "The launched");
        assert_eq!(normalize_text("The NASA rocket"), "The NASA rocket");
    }

    #[test]
    fn removes_positional_triples() {
        let out = normalize_text("placed at 0 0 612 on the page");
        assert!(!out.contains("0 0 612"), "got: {out}");
        assert!(out.contains("placed at"));
    }

    #[test]
    fn replaces_disallowed_characters() {
        assert_eq!(normalize_text("cells/tissue*organs"), "cells tissue organs");
        assert_eq!(
            normalize_text("Wait, what? (yes) it's fine-ish."),
            "Wait, what? (yes) it's fine-ish."
        );
    }

    #[test]
    fn strips_structural_tokens() {
        let out = normalize_text("12 0 obj stream endstream endobj xref trailer startxref %%EOF");
        assert_eq!(out, "");
    }

    #[test]
    fn strips_font_and_object_references() {
        let out = normalize_text("/TT1 Tf Energy flows 5 0 R through F12 ecosystems");
        assert_eq!(out, "Tf Energy flows through ecosystems");
    }

    #[test]
    fn keeps_single_letter_codes_that_are_not_fonts() {
        let out = normalize_text("Vitamin B12 and the T4 hormone, set in F3");
        assert_eq!(out, "Vitamin B12 and the T4 hormone, set in");
    }

    #[test]
    fn normalisation_is_a_fixed_point() {
        let samples = [
            "Hello world this is a test",
            "1 2 TT1 3 and then some words",
            "fooBarBaz QUUXXY 4 0 obj (Cells) divide; endobj",
            "  weird\u{2022}bullets \u{00e9}t\u{00e9} caf\u{00e9}  ",
            "ABCDEFghiJKL 1 2 3 4 5 6 stream",
            "",
        ];
        for s in samples {
            let once = normalize_text(s);
            let twice = normalize_text(&once);
            assert_eq!(once, twice, "not a fixed point for {s:?}");
        }
    }

    #[test]
    fn exposed_triple_is_removed() {
        // A single pass leaves "1 2 3"; repetition removes it.
        let out = normalize_text("1 2 TT1 3 kept");
        assert_eq!(out, "kept");
    }
}
