//! Prompt construction for the structuring service.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the output contract or the
//!    pattern-hint wording requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled prompt
//!    directly without a live service call, making regressions easy to
//!    catch.
//!
//! The prompt embeds three variable parts: the scope (whole document vs.
//! a single page), the detected answer-marker hint, and a bounded excerpt
//! of the cleaned source text. The excerpt cap bounds request size and
//! cost; it is configurable via
//! [`crate::config::ExtractionConfig::prompt_excerpt_chars`].

use crate::output::{ExtractionMethod, SourcePage};

/// Assemble the structuring instruction for one extraction unit.
///
/// * `cleaned_text` — normalised source text for this unit
/// * `marker`       — answer letter a lexical marker pointed at, if any
/// * `scope`        — whole document (direct path) or one page (OCR path)
/// * `method`       — tag the service must echo into each question
/// * `excerpt_chars` — cap on embedded text length, in characters
pub fn structuring_prompt(
    cleaned_text: &str,
    marker: Option<char>,
    scope: SourcePage,
    method: ExtractionMethod,
    excerpt_chars: usize,
) -> String {
    let page_info = match scope {
        SourcePage::WholeDocument => "the entire document".to_string(),
        SourcePage::Page(n) => format!("page {n}"),
    };

    let pattern_info = match marker {
        Some(letter) => format!(
            "PATTERN DETECTION: Found marker for answer {letter}. This is LIKELY the correct answer."
        ),
        None => "No clear answer patterns detected.".to_string(),
    };

    let marker_priority = match marker {
        Some(letter) => format!("   - If pattern indicates answer {letter}, prioritize that option\n"),
        None => String::new(),
    };

    let method_tag = match method {
        ExtractionMethod::Direct => "direct",
        ExtractionMethod::Ocr => "ocr",
    };

    format!(
        r#"Extract ALL Multiple Choice Questions (MCQs) from this PDF {page_info}.

CRITICAL ANALYSIS INSTRUCTIONS:
1. First, identify COMPLETE MCQs (question + typically 4 options A,B,C,D)
2. For EACH question, determine the correct answer using:
   - Pattern detection: {pattern_info}
   - Look for options marked with ✓, *, ✅, (correct), [x], or similar markers
{marker_priority}   - If no clear markers, use logical deduction

3. FORMAT REQUIREMENTS:
   - Return ONLY a valid JSON array
   - Each question: {{
        "question": "full question text",
        "options": ["A. option1", "B. option2", "C. option3", "D. option4"],
        "correctAnswer": index (0-3),
        "confidence": "high/medium/low",
        "extractionMethod": "{method_tag}"
     }}
   - correctAnswer index: 0=A, 1=B, 2=C, 3=D
   - Include ALL questions you can identify

TEXT CONTENT:
{excerpt}"#,
        excerpt = truncate_chars(cleaned_text, excerpt_chars),
    )
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
