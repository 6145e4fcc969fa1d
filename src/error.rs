//! Error types for the pdf2mcq library.
//!
//! The pipeline's contract is "degrade, never raise": classification
//! failures route to the image path, OCR failures yield empty
//! zero-confidence page results, service failures count as "no response"
//! and trigger the next fallback tier. Those absorbed failures are plain
//! values (see [`crate::output`] and the pipeline stages), not error types.
//!
//! [`ExtractError`] covers what is left: genuinely fatal conditions where
//! the library cannot even start (bad configuration, unreadable input
//! file, no pdfium library to bind) plus the one mid-pipeline failure the
//! design treats as fatal to a path — page rasterisation. The orchestrator
//! catches the rasterisation case internally for its final retry tier;
//! callers of the top-level entry points only ever see the start-up
//! variants.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2mcq library.
///
/// Extraction-quality failures (sparse text layer, OCR noise, malformed
/// service replies) never appear here — they degrade into an empty or
/// partial question list per the fallback chain.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium returned an error rendering a specific page.
    ///
    /// A missing bitmap cannot be partially recovered the way a missing
    /// text layer can, so this aborts the image path for the document.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Service errors ────────────────────────────────────────────────────
    /// No API credential was configured for the structuring service.
    #[error(
        "Structuring service credential is not configured.\n\
         Set DEEPSEEK_API_KEY or pass an api_key via ExtractionConfig::builder()."
    )]
    CredentialMissing,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy, or install\n\
pdfium as a system library."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterisation_display() {
        let e = ExtractError::RasterisationFailed {
            page: 7,
            detail: "bitmap allocation failed".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 7"), "got: {msg}");
        assert!(msg.contains("bitmap allocation failed"));
    }

    #[test]
    fn not_a_pdf_display() {
        let e = ExtractError::NotAPdf {
            path: PathBuf::from("/tmp/report.docx"),
            magic: [0x50, 0x4B, 0x03, 0x04],
        };
        assert!(e.to_string().contains("report.docx"));
    }

    #[test]
    fn credential_missing_mentions_env_var() {
        let e = ExtractError::CredentialMissing;
        assert!(e.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn invalid_config_display() {
        let e = ExtractError::InvalidConfig("render scale must be 1.0–4.0".into());
        assert!(e.to_string().contains("render scale"));
    }
}
