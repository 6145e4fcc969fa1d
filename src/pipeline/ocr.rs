//! OCR adapter: recognise one rendered page via a scoped tesseract worker.
//!
//! ## Worker lifecycle
//!
//! A fresh engine handle is created for every page, used once, and
//! dropped on every exit path — including the failure branch. Pooling
//! would save a few milliseconds of init per page, but the enforced
//! inter-page service delay already bounds throughput, and a worker that
//! never outlives its page can never leak state between pages.
//!
//! ## Engine configuration
//!
//! * **PSM single-block** — exam sheets read as one uniform block of
//!   text; letting tesseract auto-segment invites column hallucinations.
//! * **Character whitelist** — A–Z/a–z/0–9 plus punctuation and the four
//!   answer-marker symbols (✓ * ✅ x). Restricting the alphabet
//!   measurably improves accuracy on this structured content.
//!
//! Any engine failure degrades to an empty zero-confidence result: OCR
//! trouble on one page must never abort the batch.

use crate::markers;
use crate::pipeline::{normalize, PageImage, PageText};
use tesseract::{PageSegMode, Tesseract};
use tracing::{debug, warn};

/// Characters the engine is allowed to emit. Everything else is noise
/// for answer-sheet content and only degrades recognition.
const CHAR_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 .,?!()[]{}:;-/\n\t✓*✅x";

/// Recognise one page image, consuming (and dropping) its bitmap.
///
/// Returns raw text, cleaned text, any detected answer marker, and the
/// engine-reported confidence (0–100). Never fails: engine errors yield
/// [`PageText::empty`].
pub async fn recognize_page(image: PageImage, language: &str) -> PageText {
    let page_number = image.page_number;
    let language = language.to_string();

    let result =
        tokio::task::spawn_blocking(move || recognize_blocking(&image.png, &language)).await;

    match result {
        Ok(Ok((raw_text, confidence))) => {
            let cleaned_text = normalize::clean_ocr_text(&raw_text);
            let answer_marker = markers::detect_answer_marker(&raw_text);
            debug!(
                "OCR page {}: {} cleaned chars, confidence {:.0}",
                page_number,
                cleaned_text.len(),
                confidence
            );
            if let Some(letter) = answer_marker {
                debug!("OCR page {page_number}: marker hints at answer {letter}");
            }
            PageText {
                raw_text,
                cleaned_text,
                answer_marker,
                confidence,
            }
        }
        Ok(Err(detail)) => {
            warn!("OCR failed on page {page_number}: {detail}");
            PageText::empty()
        }
        Err(e) => {
            warn!("OCR task panicked on page {page_number}: {e}");
            PageText::empty()
        }
    }
}

/// Blocking recognition pass over one PNG. The worker lives entirely
/// inside this function.
fn recognize_blocking(png: &[u8], language: &str) -> Result<(String, f32), String> {
    let mut worker = Tesseract::new(None, Some(language))
        .map_err(|e| format!("engine init: {e}"))?
        .set_variable("tessedit_char_whitelist", CHAR_WHITELIST)
        .map_err(|e| format!("whitelist: {e}"))?
        .set_image_from_mem(png)
        .map_err(|e| format!("image load: {e}"))?;

    worker.set_page_seg_mode(PageSegMode::PsmSingleBlock);

    let text = worker.get_text().map_err(|e| format!("recognition: {e}"))?;
    let confidence = (worker.mean_text_conf() as f32).clamp(0.0, 100.0);

    Ok((text, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Recognition over a real bitmap needs the tesseract library and
    // training data; that path is covered by the env-gated integration
    // tests. The degrade contract is testable everywhere.

    #[tokio::test]
    async fn invalid_png_degrades_to_empty_result() {
        let image = PageImage {
            page_number: 4,
            png: b"definitely not a png".to_vec(),
            width: 0,
            height: 0,
        };
        let text = recognize_page(image, "eng").await;
        assert!(text.raw_text.is_empty());
        assert!(text.cleaned_text.is_empty());
        assert!(text.answer_marker.is_none());
        assert_eq!(text.confidence, 0.0);
    }

    #[test]
    fn whitelist_covers_marker_symbols() {
        for symbol in ['✓', '*', '✅', 'x'] {
            assert!(CHAR_WHITELIST.contains(symbol), "missing {symbol}");
        }
    }
}
