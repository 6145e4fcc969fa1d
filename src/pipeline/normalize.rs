//! Text normalisation: deterministic cleanup of extracted and OCR text.
//!
//! Two distinct cleaners for two distinct kinds of dirt:
//!
//! * [`clean_text`] — for text pulled from a PDF's embedded layer, which
//!   arrives with stray control bytes, exotic Unicode from font encodings,
//!   and ragged per-item spacing.
//! * [`clean_ocr_text`] — for recognition output, which additionally
//!   glues sentences together (`word.Next`) and produces runs of blank
//!   lines where the page layout had whitespace.
//!
//! Marker detection runs on the *raw* text, before either cleaner: the
//! checkmark/✅ glyphs it looks for are exactly the non-ASCII characters
//! the cleaners strip.
//!
//! Each rule is a small pure function (`&str → String`) with no shared
//! state, applied in a defined order, so rules are independently testable
//! and safe to re-order or extend.

use once_cell::sync::Lazy;
use regex::Regex;

/// Normalise text extracted from a PDF text layer.
///
/// Rules (applied in order):
/// 1. Strip bytes outside printable ASCII (keeping `\n`, `\r`, `\t`)
/// 2. Collapse runs of spaces/tabs to a single space
/// 3. Collapse runs of newlines to a single newline
/// 4. Trim each line and drop lines left empty
pub fn clean_text(text: &str) -> String {
    let s = strip_nonprintable(text);
    let s = collapse_inline_whitespace(&s);
    let s = collapse_newlines(&s);
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Normalise OCR engine output.
///
/// Rules (applied in order):
/// 1. Collapse blank-line runs to a single newline
/// 2. Collapse runs of spaces/tabs to a single space
/// 3. Re-insert the space OCR drops after sentence periods (`a.B` → `a. B`)
/// 4. Strip bytes outside printable ASCII
pub fn clean_ocr_text(text: &str) -> String {
    let s = collapse_blank_lines(text);
    let s = collapse_inline_whitespace(&s);
    let s = fix_sentence_spacing(&s);
    strip_nonprintable(&s).trim().to_string()
}

// ── Rules ────────────────────────────────────────────────────────────────

fn strip_nonprintable(input: &str) -> String {
    input
        .chars()
        .filter(|&c| ('\x20'..='\x7E').contains(&c) || c == '\n' || c == '\r' || c == '\t')
        .collect()
}

static RE_INLINE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_inline_whitespace(input: &str) -> String {
    RE_INLINE_WS.replace_all(input, " ").to_string()
}

static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r]+").unwrap());

fn collapse_newlines(input: &str) -> String {
    RE_NEWLINES.replace_all(input, "\n").to_string()
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n").to_string()
}

static RE_GLUED_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z])\.([a-zA-Z])").unwrap());

fn fix_sentence_spacing(input: &str) -> String {
    RE_GLUED_SENTENCE.replace_all(input, "$1. $2").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_and_unicode_junk() {
        let input = "Question\u{0000} 1:\u{00A0}what\u{FEFF} is it?";
        assert_eq!(clean_text(input), "Question 1:what is it?");
    }

    #[test]
    fn strips_marker_glyphs() {
        // The raw text keeps ✓/✅ for the marker detector; cleaning drops them.
        let input = "A) Paris ✓\nB) London ✅";
        assert_eq!(clean_text(input), "A) Paris\nB) London");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let input = "What   is\t\tthe    answer?";
        assert_eq!(clean_text(input), "What is the answer?");
    }

    #[test]
    fn drops_empty_lines_and_trims() {
        let input = "  Q1. First  \n\n\n   \n  Q2. Second  ";
        assert_eq!(clean_text(input), "Q1. First\nQ2. Second");
    }

    #[test]
    fn clean_text_handles_crlf() {
        let input = "line one\r\nline two\r\rline three";
        assert_eq!(clean_text(input), "line one\nline two\nline three");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_ocr_text(""), "");
    }

    #[test]
    fn ocr_collapses_blank_lines() {
        let input = "Question 1\n   \nA) first\n\nB) second";
        assert_eq!(clean_ocr_text(input), "Question 1\nA) first\nB) second");
    }

    #[test]
    fn ocr_fixes_glued_sentences() {
        let input = "The answer is Paris.Next question follows.";
        assert_eq!(
            clean_ocr_text(input),
            "The answer is Paris. Next question follows."
        );
    }

    #[test]
    fn ocr_does_not_touch_decimals() {
        let input = "The value is 3.14 exactly";
        assert_eq!(clean_ocr_text(input), "The value is 3.14 exactly");
    }

    #[test]
    fn cleaners_are_idempotent() {
        let input = "Q1.   What?\n\n\nA) one\u{00A0}\nB)two.Three";
        let once = clean_ocr_text(input);
        assert_eq!(clean_ocr_text(&once), once);

        let once = clean_text(input);
        assert_eq!(clean_text(&once), once);
    }
}
