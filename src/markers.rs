//! Answer-marker detection: lexical heuristics for "which option is
//! marked correct" in raw source text.
//!
//! Exam sheets and answer keys mark the correct option in a handful of
//! recurring ways — a checkmark next to the letter, an asterisk, a
//! `[x]` box, a `(correct)` suffix. Detection runs over the *raw* text
//! (before normalisation strips the non-ASCII glyphs) and the result is
//! fed to the prompt builder as a hint, not treated as ground truth.
//!
//! Patterns are tried in a fixed precedence order: symbolic and explicit
//! markers first, because the generic `correct…`/`answer…` textual
//! patterns can trigger on the question stem itself ("which of these is
//! correct?"). The first pattern with any match wins, and the first A–D
//! letter inside that match is returned uppercased. The ordering is a
//! field-tuned heuristic; treat it as data, not as a ranking with a
//! principled derivation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker patterns in precedence order. Lower index = higher trust.
static MARKER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("checkmark", r"(?i)✓\s*[A-D]"),
        ("asterisk", r"(?i)\*\s*[A-D]"),
        ("bracket", r"(?i)\[[x✓]\][A-D]"),
        ("correct-suffix", r"(?i)[A-D]\s*\(correct\)"),
        ("emoji-check", r"(?i)[A-D]\s*✅"),
        ("answer-tag", r"(?i)[A-D].*?\[answer\]"),
        ("correct-text", r"(?i)correct.*?[A-D]"),
        ("answer-text", r"(?i)answer.*?[A-D]"),
    ]
    .iter()
    .map(|&(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// Scan raw text for an answer marker, returning the indicated option
/// letter (`A`–`D`, uppercased) or `None` when no pattern matches.
///
/// Deterministic and side-effect free: identical input always yields the
/// identical letter.
pub fn detect_answer_marker(text: &str) -> Option<char> {
    for (name, pattern) in MARKER_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            if let Some(letter) = first_option_letter(m.as_str()) {
                tracing::debug!(pattern = name, letter = %letter, "answer marker detected");
                return Some(letter);
            }
        }
    }
    None
}

/// First A–D letter (either case) in the matched fragment, uppercased.
fn first_option_letter(fragment: &str) -> Option<char> {
    fragment
        .chars()
        .find(|c| matches!(c.to_ascii_uppercase(), 'A'..='D'))
        .map(|c| c.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkmark_adjacent_letter() {
        assert_eq!(
            detect_answer_marker("The capital is Paris. ✓ B) Paris"),
            Some('B')
        );
    }

    #[test]
    fn asterisk_adjacent_letter() {
        assert_eq!(detect_answer_marker("Options: A) 1  * C) 3  D) 4"), Some('C'));
    }

    #[test]
    fn bracketed_marker() {
        assert_eq!(detect_answer_marker("[x]D all of the above"), Some('D'));
        assert_eq!(detect_answer_marker("[X]a none"), Some('A'));
    }

    #[test]
    fn correct_suffix() {
        assert_eq!(detect_answer_marker("B (correct)"), Some('B'));
    }

    #[test]
    fn emoji_checkmark_suffix() {
        assert_eq!(detect_answer_marker("C ✅"), Some('C'));
    }

    #[test]
    fn answer_tag() {
        assert_eq!(detect_answer_marker("D. 42 [answer]"), Some('D'));
    }

    #[test]
    fn lowercase_letter_is_uppercased() {
        assert_eq!(detect_answer_marker("✓ b) Paris"), Some('B'));
    }

    #[test]
    fn no_marker_yields_none() {
        assert_eq!(
            detect_answer_marker("Which of the following is a mammal?"),
            None
        );
        assert_eq!(detect_answer_marker(""), None);
    }

    #[test]
    fn symbolic_markers_outrank_textual_patterns() {
        // Both "correct" and a checkmark appear; the checkmark wins.
        let text = "Mark the correct option below.\nA) one\n✓ D) four";
        assert_eq!(detect_answer_marker(text), Some('D'));
    }

    #[test]
    fn generic_patterns_still_fire_without_symbols() {
        // Low-precision tier: any "correct…letter" run produces a hint.
        assert!(detect_answer_marker("the correct choice is b").is_some());
        assert!(detect_answer_marker("answer: c").is_some());
    }

    #[test]
    fn detection_is_idempotent() {
        let text = "Q1. What? ✓ A) this  B) that";
        let first = detect_answer_marker(text);
        let second = detect_answer_marker(text);
        assert_eq!(first, second);
        assert_eq!(first, Some('A'));
    }
}
