//! Response parsing: recover a JSON question array from free-form text.
//!
//! The structuring service is asked for "ONLY a valid JSON array", and
//! mostly complies — wrapped in markdown fences, prefixed with a polite
//! sentence, or occasionally truncated mid-element. The recovery ladder:
//!
//! 1. Strip any ```json fences.
//! 2. Locate the outermost `[ { … } ]` block by bracket-matching regex
//!    and parse that.
//! 3. Failing that, parse the whole cleaned reply.
//! 4. Failing that, return an empty list. A malformed reply degrades to
//!    "no questions extracted for this unit", never a pipeline abort.
//!
//! Parsed questions are stamped with the extraction method, the source
//! page, and — when a lexical marker corroborated the answer — the
//! pattern letter plus an elevated default confidence. A symbolic marker
//! in the source text is independent evidence the service's answer index
//! is right, which is what the High tier means.

use crate::output::{Confidence, ExtractionMethod, Question, SourcePage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// A question object as the service emits it, before stamping.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_answer: usize,
    #[serde(default)]
    confidence: Option<Confidence>,
}

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

static RE_JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap());

/// Parse the service reply for one extraction unit into question records.
///
/// * `marker` — the unit's detected answer letter, stamped onto every
///   question when present (with confidence defaulting to High)
/// * `method`/`page` — provenance tags for every question
///
/// Returns an empty list on any decode failure.
pub fn parse_questions(
    response: &str,
    marker: Option<char>,
    method: ExtractionMethod,
    page: SourcePage,
) -> Vec<Question> {
    let cleaned = RE_FENCE.replace_all(response, "").trim().to_string();

    let raw: Vec<RawQuestion> = match RE_JSON_ARRAY.find(&cleaned) {
        Some(m) => decode(m.as_str()).or_else(|| decode(&cleaned)),
        None => decode(&cleaned),
    }
    .unwrap_or_default();

    debug!("Parsed {} questions from service reply", raw.len());

    raw.into_iter()
        .map(|q| {
            let confidence = match (marker, q.confidence) {
                // A corroborating marker justifies elevated trust when the
                // service did not state its own confidence.
                (Some(_), None) => Confidence::High,
                (_, explicit) => explicit.unwrap_or_default(),
            };
            Question {
                question: q.question,
                options: q.options,
                correct_answer: q.correct_answer,
                confidence,
                page,
                extraction_method: method,
                pattern_detected: marker,
            }
        })
        .collect()
}

/// Decode a candidate JSON fragment, logging (not raising) on failure.
fn decode(candidate: &str) -> Option<Vec<RawQuestion>> {
    match serde_json::from_str(candidate) {
        Ok(questions) => Some(questions),
        Err(e) => {
            warn!(
                "Service reply is not a question array: {e} (sample: {:.120})",
                candidate
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"[
        {
            "question": "What is the capital of France?",
            "options": ["A. London", "B. Paris", "C. Berlin", "D. Madrid"],
            "correctAnswer": 1,
            "confidence": "medium"
        },
        {
            "question": "Which planet is largest?",
            "options": ["A. Earth", "B. Mars", "C. Jupiter", "D. Venus"],
            "correctAnswer": 2,
            "confidence": "low"
        }
    ]"#;

    fn parse_plain(response: &str) -> Vec<Question> {
        parse_questions(
            response,
            None,
            ExtractionMethod::Direct,
            SourcePage::WholeDocument,
        )
    }

    #[test]
    fn parses_bare_array() {
        let questions = parse_plain(WELL_FORMED);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_answer, 1);
        assert_eq!(questions[0].confidence, Confidence::Medium);
        assert_eq!(questions[1].confidence, Confidence::Low);
    }

    #[test]
    fn fenced_and_unfenced_replies_parse_identically() {
        let fenced = format!("```json\n{WELL_FORMED}\n```");
        let a = parse_plain(WELL_FORMED);
        let b = parse_plain(&fenced);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.question, y.question);
            assert_eq!(x.options, y.options);
            assert_eq!(x.correct_answer, y.correct_answer);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[test]
    fn tolerates_surrounding_commentary() {
        let reply = format!(
            "Here are the questions I found:\n\n{WELL_FORMED}\n\nLet me know if you need more."
        );
        assert_eq!(parse_plain(&reply).len(), 2);
    }

    #[test]
    fn malformed_reply_yields_empty_list() {
        assert!(parse_plain("I could not find any questions.").is_empty());
        assert!(parse_plain("").is_empty());
        assert!(parse_plain("{\"question\": \"not an array\"}").is_empty());
    }

    #[test]
    fn truncated_json_yields_empty_list() {
        let truncated = &WELL_FORMED[..WELL_FORMED.len() / 2];
        assert!(parse_plain(truncated).is_empty());
    }

    #[test]
    fn marker_stamps_pattern_and_elevates_default_confidence() {
        let reply = r#"[{
            "question": "Q?",
            "options": ["A. x", "B. y"],
            "correctAnswer": 1
        }]"#;
        let questions = parse_questions(
            reply,
            Some('B'),
            ExtractionMethod::Ocr,
            SourcePage::Page(3),
        );
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].pattern_detected, Some('B'));
        assert_eq!(questions[0].confidence, Confidence::High);
        assert_eq!(questions[0].page, SourcePage::Page(3));
        assert_eq!(questions[0].extraction_method, ExtractionMethod::Ocr);
    }

    #[test]
    fn explicit_confidence_survives_marker_stamping() {
        let reply = r#"[{
            "question": "Q?",
            "options": ["A. x", "B. y"],
            "correctAnswer": 0,
            "confidence": "low"
        }]"#;
        let questions = parse_questions(
            reply,
            Some('A'),
            ExtractionMethod::Ocr,
            SourcePage::Page(1),
        );
        assert_eq!(questions[0].confidence, Confidence::Low);
        assert_eq!(questions[0].pattern_detected, Some('A'));
    }

    #[test]
    fn missing_confidence_without_marker_defaults_to_medium() {
        let reply = r#"[{
            "question": "Q?",
            "options": ["A. x", "B. y"],
            "correctAnswer": 0
        }]"#;
        let questions = parse_plain(reply);
        assert_eq!(questions[0].confidence, Confidence::Medium);
        assert_eq!(questions[0].pattern_detected, None);
    }

    #[test]
    fn empty_array_is_a_valid_reply() {
        assert!(parse_plain("[]").is_empty());
    }
}
