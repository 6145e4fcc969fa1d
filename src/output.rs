//! Output types: the structured question records and run statistics.
//!
//! Everything here is serialisable with the camelCase field names the
//! downstream persistence layer expects (`question`, `options`,
//! `correctAnswer`, `patternDetected`, …), so a caller can hand a
//! [`Question`] straight to its review/storage boundary as JSON.
//!
//! The core never persists anything itself. Its only contract with the
//! persistence boundary is the shape of [`Question`] and the invariant
//! that `correct_answer` must index an option that actually exists —
//! which the orchestrator deliberately does NOT enforce (the structuring
//! service is fallible and a malformed record is still reviewable).
//! Callers validate with [`Question::is_well_formed`] before saving.

use serde::{Deserialize, Serialize};

/// Confidence tier assigned to a question's answer determination.
///
/// This is a best-guess label, not ground truth: `High` usually means a
/// corroborating symbolic marker (✓, *, …) was found in the source text,
/// `Low` means the structuring service had to deduce the answer from the
/// question content alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

/// How the question's source text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Pulled from the document's embedded text layer.
    Direct,
    /// Recognised from a rendered page bitmap.
    Ocr,
}

/// Where in the document a question came from.
///
/// Direct extraction prompts on the whole document at once, so its
/// questions carry the `"full_document"` sentinel rather than a page
/// number. OCR extraction is per-page and tags the 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePage {
    WholeDocument,
    Page(usize),
}

impl Serialize for SourcePage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SourcePage::WholeDocument => serializer.serialize_str("full_document"),
            SourcePage::Page(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for SourcePage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let v = serde_json::Value::deserialize(deserializer)?;
        match v {
            serde_json::Value::String(ref s) if s == "full_document" => {
                Ok(SourcePage::WholeDocument)
            }
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|n| SourcePage::Page(n as usize))
                .ok_or_else(|| D::Error::custom("page number out of range")),
            other => Err(D::Error::custom(format!(
                "expected \"full_document\" or a page number, got {other}"
            ))),
        }
    }
}

/// One extracted multiple-choice question.
///
/// The terminal artifact of the pipeline; immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Full question stem.
    pub question: String,

    /// Ordered option texts, each prefixed with its letter label
    /// (e.g. `"A. Paris"`).
    pub options: Vec<String>,

    /// 0-based index into `options` of the determined correct answer.
    pub correct_answer: usize,

    /// Confidence tier for the answer determination.
    #[serde(default)]
    pub confidence: Confidence,

    /// Source location: a 1-based page number, or `"full_document"`.
    pub page: SourcePage,

    /// How the source text was obtained.
    pub extraction_method: ExtractionMethod,

    /// The answer letter a lexical marker pointed at, when one was found
    /// in the raw source text (e.g. `✓ B`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_detected: Option<char>,
}

impl Question {
    /// Check the persistence-boundary invariant: options are non-empty
    /// and `correct_answer` references one of them.
    ///
    /// The orchestrator never filters on this — callers must, before
    /// handing records to storage.
    pub fn is_well_formed(&self) -> bool {
        !self.options.is_empty() && self.correct_answer < self.options.len()
    }
}

/// Statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    /// Pages in the document (0 when the document could not be opened).
    pub total_pages: usize,
    /// Pages whose OCR text was too sparse to prompt on (image path only).
    pub skipped_pages: usize,
    /// Questions extracted via the direct text layer.
    pub direct_questions: usize,
    /// Questions extracted via OCR.
    pub ocr_questions: usize,
    /// Questions carrying a lexical pattern hint.
    pub with_pattern: usize,
    /// Wall-clock duration of the whole run.
    pub total_duration_ms: u64,
    /// Time spent inside structuring-service calls.
    pub service_duration_ms: u64,
}

/// The result of one extraction run: the question list plus run stats.
///
/// An empty `questions` with no error is a valid outcome — the upload
/// flow must be able to surface "0 questions found" without a server
/// error, so the pipeline degrades to this rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub questions: Vec<Question>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Number of extracted questions.
    pub fn count(&self) -> usize {
        self.questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            question: "What is the capital of France?".into(),
            options: vec![
                "A. London".into(),
                "B. Paris".into(),
                "C. Berlin".into(),
                "D. Madrid".into(),
            ],
            correct_answer: 1,
            confidence: Confidence::High,
            page: SourcePage::Page(3),
            extraction_method: ExtractionMethod::Ocr,
            pattern_detected: Some('B'),
        }
    }

    #[test]
    fn question_serialises_with_wire_names() {
        let q = sample_question();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["correctAnswer"], 1);
        assert_eq!(json["confidence"], "high");
        assert_eq!(json["page"], 3);
        assert_eq!(json["extractionMethod"], "ocr");
        assert_eq!(json["patternDetected"], "B");
    }

    #[test]
    fn whole_document_serialises_as_sentinel() {
        let mut q = sample_question();
        q.page = SourcePage::WholeDocument;
        q.extraction_method = ExtractionMethod::Direct;
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["page"], "full_document");
        assert_eq!(json["extractionMethod"], "direct");
    }

    #[test]
    fn source_page_round_trips() {
        for page in [SourcePage::WholeDocument, SourcePage::Page(12)] {
            let json = serde_json::to_string(&page).unwrap();
            let back: SourcePage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, page);
        }
    }

    #[test]
    fn pattern_field_omitted_when_absent() {
        let mut q = sample_question();
        q.pattern_detected = None;
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("patternDetected").is_none());
    }

    #[test]
    fn well_formed_checks_index_bounds() {
        let mut q = sample_question();
        assert!(q.is_well_formed());

        q.correct_answer = 4;
        assert!(!q.is_well_formed());

        q.correct_answer = 0;
        q.options.clear();
        assert!(!q.is_well_formed());
    }

    #[test]
    fn missing_confidence_defaults_to_medium() {
        let json = r#"{
            "question": "Q?",
            "options": ["A. x", "B. y"],
            "correctAnswer": 0,
            "page": 1,
            "extractionMethod": "ocr"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.confidence, Confidence::Medium);
    }
}
