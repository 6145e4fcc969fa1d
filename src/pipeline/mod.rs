//! Pipeline stages for MCQ extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the OCR backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ classify ─┬─▶ direct ──────────────▶ structure ──▶ parse
//!                     │   (text layer)            (LLM API)    (JSON)
//!                     └─▶ render ──▶ ocr ── per page ──▶ structure ──▶ parse
//!                         (pdfium)   (tesseract)
//! ```
//!
//! 1. [`classify`]  — sample the text layer and decide text-based vs. image-based
//! 2. [`direct`]    — pull the whole text layer (text-based documents)
//! 3. [`render`]    — rasterise one page to a PNG; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 4. [`ocr`]       — recognise one page bitmap via a scoped tesseract worker
//! 5. [`normalize`] — deterministic text cleanup (raw and OCR variants)
//! 6. [`structure`] — send the prompt to the structuring service; the only
//!    stage with network I/O
//! 7. [`parse`]     — recover the JSON question array from the free-form reply
//!
//! The fallback sequencing between stages lives in [`crate::extract`], not
//! here: stages report plain outcomes and the orchestrator decides what
//! degradation means.

pub mod classify;
pub mod direct;
pub mod normalize;
pub mod ocr;
pub mod parse;
pub mod render;
pub mod structure;

use crate::error::ExtractError;
use pdfium_render::prelude::*;

/// Text recovered from one extraction unit — the whole document on the
/// direct path, a single page on the OCR path.
///
/// `raw_text` is kept alongside `cleaned_text` because marker detection
/// must see the pre-cleaning glyphs (✓, ✅) that normalisation strips.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Engine output before any normalisation.
    pub raw_text: String,
    /// Normalised text, ready for prompting.
    pub cleaned_text: String,
    /// Answer letter a lexical marker pointed at, if any.
    pub answer_marker: Option<char>,
    /// Extraction confidence, 0–100. Engine-reported for OCR;
    /// 100 for direct text-layer extraction.
    pub confidence: f32,
}

impl PageText {
    /// The empty zero-confidence result an OCR failure degrades to.
    pub fn empty() -> Self {
        Self {
            raw_text: String::new(),
            cleaned_text: String::new(),
            answer_marker: None,
            confidence: 0.0,
        }
    }
}

/// One rasterised page, PNG-encoded and ready for recognition.
///
/// Owned by the rasteriser, consumed and dropped by the OCR adapter —
/// only one page bitmap is resident at a time.
#[derive(Clone)]
pub struct PageImage {
    /// 1-based page number.
    pub page_number: usize,
    /// PNG-encoded page bitmap, alpha flattened onto white.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImage")
            .field("page_number", &self.page_number)
            .field("png_bytes", &self.png.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Bind to a pdfium library, honouring `PDFIUM_LIB_PATH` before falling
/// back to a copy next to the executable and then the system library.
///
/// Returns a typed error instead of panicking so callers that must
/// degrade (the classifier) can absorb a missing library the same way
/// they absorb corrupt bytes.
pub(crate) fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path)
            .or_else(|_| Pdfium::bind_to_system_library()),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}
