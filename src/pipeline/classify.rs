//! PDF type classification: does this document carry a usable text layer?
//!
//! Samples at most the first three pages rather than reading the whole
//! document — classification must stay cheap because it runs before any
//! real work, and three pages are enough to distinguish a born-digital
//! exam sheet from a scan. The decision rule has two triggers:
//!
//! * total normalised sample text exceeds 300 characters, OR
//! * any single sampled page contributed more than 100 raw characters.
//!
//! The second trigger matters for documents whose first pages are image
//! plates (a scanned cover) followed by a dense text page — one good page
//! is a stronger signal than a diluted average.
//!
//! Every failure mode (corrupt bytes, unsupported encryption, no pdfium
//! library at all) collapses to the conservative default: image-based,
//! zero pages. Downstream then attempts OCR, which itself degrades
//! gracefully into an empty result.

use crate::pipeline::{bind_pdfium, normalize};
use tracing::{debug, info, warn};

/// How many leading pages to sample for the text-layer probe.
const SAMPLE_PAGES: usize = 3;

/// Normalised sample length above which the document counts as text-based.
const TEXT_LAYER_THRESHOLD: usize = 300;

/// Raw per-page character count that marks a page as substantial.
const SUBSTANTIAL_PAGE_THRESHOLD: usize = 100;

/// Classification verdict for one document. Produced once, immutable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    /// Whether the document has a usable embedded text layer.
    pub is_text_based: bool,
    /// Page count (0 when the document could not be opened).
    pub page_count: usize,
    /// First 500 characters of the normalised sample text.
    pub sample_text: String,
}

impl PdfInfo {
    /// The conservative verdict used when the document cannot be opened:
    /// assume image-based and let the OCR path find out.
    fn unreadable() -> Self {
        Self {
            is_text_based: false,
            page_count: 0,
            sample_text: String::new(),
        }
    }
}

/// Classify a document from its raw bytes. Never fails: any open or
/// binding error yields the conservative image-based default.
pub async fn classify(bytes: &[u8]) -> PdfInfo {
    let owned = bytes.to_vec();
    let result = tokio::task::spawn_blocking(move || classify_blocking(&owned)).await;

    match result {
        Ok(Ok(info)) => {
            info!(
                "PDF type: {} ({} pages, {} sample chars)",
                if info.is_text_based { "text-based" } else { "image-based" },
                info.page_count,
                info.sample_text.len()
            );
            info
        }
        Ok(Err(e)) => {
            warn!("Classification failed, assuming image-based: {e}");
            PdfInfo::unreadable()
        }
        Err(e) => {
            warn!("Classification task panicked, assuming image-based: {e}");
            PdfInfo::unreadable()
        }
    }
}

/// Blocking implementation of classification.
fn classify_blocking(bytes: &[u8]) -> Result<PdfInfo, crate::error::ExtractError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| crate::error::ExtractError::Internal(format!("{e:?}")))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    let sample_count = page_count.min(SAMPLE_PAGES);

    let mut sample = String::new();
    let mut has_substantial_page = false;

    for idx in 0..sample_count {
        // A page that fails text extraction just contributes nothing to
        // the sample; the remaining pages still decide the verdict.
        let page_text = match pages.get(idx as u16).and_then(|page| {
            page.text().map(|t| t.all())
        }) {
            Ok(text) => text,
            Err(e) => {
                debug!("Page {} sampling failed: {e:?}", idx + 1);
                continue;
            }
        };

        debug!("Page {} has {} raw characters", idx + 1, page_text.len());
        if page_text.chars().count() > SUBSTANTIAL_PAGE_THRESHOLD {
            has_substantial_page = true;
        }

        sample.push_str(&page_text);
        sample.push(' ');
    }

    let cleaned = normalize::clean_text(&sample);
    let is_text_based = cleaned.len() > TEXT_LAYER_THRESHOLD || has_substantial_page;

    Ok(PdfInfo {
        is_text_based,
        page_count,
        sample_text: cleaned.chars().take(500).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Classification over real documents needs a pdfium library and is
    // covered by the env-gated integration tests. The degrade contract
    // on unreadable input is testable everywhere: whatever fails first
    // (binding or parsing), the verdict must be the conservative default.

    #[tokio::test]
    async fn zero_byte_buffer_yields_conservative_default() {
        let info = classify(&[]).await;
        assert_eq!(
            info,
            PdfInfo {
                is_text_based: false,
                page_count: 0,
                sample_text: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn garbage_bytes_yield_conservative_default() {
        let info = classify(b"this is not a pdf at all").await;
        assert!(!info.is_text_based);
        assert_eq!(info.page_count, 0);
        assert!(info.sample_text.is_empty());
    }

    #[test]
    fn unreadable_verdict_shape() {
        let info = PdfInfo::unreadable();
        assert!(!info.is_text_based);
        assert_eq!(info.page_count, 0);
    }
}
