//! # pdf2mcq
//!
//! Extract multiple-choice questions (MCQs) from PDF documents — both
//! born-digital PDFs with an embedded text layer and scanned/image-only
//! PDFs — producing structured question records with a best-effort,
//! confidence-labeled determination of the correct answer.
//!
//! ## Why this crate?
//!
//! Exam sheets and question banks arrive as whatever PDF the author had:
//! a clean export with selectable text, or a phone-scanned answer key
//! where the only correctness signal is a handwritten checkmark. One
//! extraction strategy cannot serve both. This crate classifies the
//! document first, pulls the text layer when there is one, rasterises
//! and OCRs when there is not, and hands the recovered text — plus any
//! detected answer-marker hint — to an LLM structuring service that
//! returns the question records.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Classify   sample 3 pages, text-based or image-based?
//!  ├─ 2a. Direct    pull the text layer, whole document at once
//!  ├─ 2b. Image     per page: rasterise (pdfium) → OCR (tesseract)
//!  ├─ 3. Markers    scan raw text for ✓ * ✅ (correct) [x] answer cues
//!  ├─ 4. Structure  prompt the completion API (DeepSeek-style)
//!  ├─ 5. Parse      recover the JSON question array from the reply
//!  └─ 6. Output     Question records + run stats
//! ```
//!
//! Each tier degrades instead of failing: an unreadable document is
//! treated as image-based, a sparse text layer falls back to OCR, a dead
//! page contributes nothing, and a document that defeats everything
//! yields an empty-but-successful result. Callers always get either a
//! question list or one typed start-up error — never a crash halfway.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2mcq::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from DEEPSEEK_API_KEY
//!     let config = ExtractionConfig::from_env();
//!     let bytes = std::fs::read("exam.pdf")?;
//!     let output = extract(&bytes, &config).await?;
//!     for q in &output.questions {
//!         // Validate before persisting — the pipeline does not.
//!         if q.is_well_formed() {
//!             println!("{} ({:?})", q.question, q.confidence);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2mcq` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2mcq = { version = "0.3", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * A pdfium shared library (system copy, or `PDFIUM_LIB_PATH`).
//! * libtesseract with the `eng` training data, for scanned documents.
//! * A structuring-service API key (`DEEPSEEK_API_KEY` by default).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod markers;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use extract::{extract, extract_from_file, extract_to_file};
pub use markers::detect_answer_marker;
pub use output::{
    Confidence, ExtractionMethod, ExtractionOutput, ExtractionStats, Question, SourcePage,
};
pub use pipeline::classify::{classify, PdfInfo};
pub use pipeline::{PageImage, PageText};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
