//! Direct text extraction: pull the embedded text layer page-by-page.
//!
//! Used only after classification says the document is text-based. The
//! whole document becomes a single extraction unit — MCQs routinely span
//! page breaks in born-digital exams, and one prompt over the full text
//! lets the structuring service stitch them back together.
//!
//! A single page failing text extraction must not lose the rest of the
//! document: the failed page gets an inline placeholder section and the
//! loop continues. Only a failure to open the document at all is an
//! error, and the orchestrator answers that by restarting down the image
//! path.

use crate::error::ExtractError;
use crate::markers;
use crate::pipeline::{bind_pdfium, normalize, PageText};
use tracing::{debug, warn};

/// Extract the full text layer as one whole-document [`PageText`].
///
/// Marker detection runs on the raw concatenated text, before
/// normalisation strips the checkmark glyphs. Confidence is fixed at 100:
/// an embedded text layer is authoritative, unlike OCR output.
///
/// # Errors
/// Only when the document cannot be opened at all. Per-page extraction
/// failures degrade to inline placeholders.
pub async fn extract_text(bytes: &[u8]) -> Result<PageText, ExtractError> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || extract_text_blocking(&owned))
        .await
        .map_err(|e| ExtractError::Internal(format!("Text extraction task panicked: {e}")))?
}

/// Blocking implementation of whole-document text extraction.
fn extract_text_blocking(bytes: &[u8]) -> Result<PageText, ExtractError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractError::Internal(format!("Failed to open PDF: {e:?}")))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    debug!("Extracting text layer from {} pages", total_pages);

    let mut full_text = String::new();

    for idx in 0..total_pages {
        let section = match pages.get(idx as u16).and_then(|page| {
            page.text().map(|t| t.all())
        }) {
            Ok(text) => text,
            Err(e) => {
                warn!("Page {} text extraction failed: {e:?}", idx + 1);
                "[Text extraction partially failed]".to_string()
            }
        };

        full_text.push_str(&format!("\n--- Page {} ---\n{}\n", idx + 1, section));
    }

    let cleaned_text = normalize::clean_text(&full_text);
    let answer_marker = markers::detect_answer_marker(&full_text);
    debug!(
        "Text layer extraction complete: {} cleaned characters",
        cleaned_text.len()
    );

    Ok(PageText {
        raw_text: full_text,
        cleaned_text,
        answer_marker,
        confidence: 100.0,
    })
}
