//! Pipeline orchestration and public entry points.
//!
//! The fallback chain is an explicit state machine rather than nested
//! exception handling, so the "degrade, never raise" contract stays
//! auditable:
//!
//! ```text
//! Classify ──▶ DirectPath ──▶ Structure ──▶ Parse ──▶ Done
//!    │              │ insufficient / no response
//!    │ unreadable   ▼
//!    └────────▶ ImagePath (per page: render → ocr → structure → parse)
//!                   │ error
//!                   ▼
//!               ImagePath retry (whole document, from scratch)
//!                   │ error
//!                   ▼
//!               empty question list
//! ```
//!
//! Every transition outcome is a typed value ([`DirectOutcome`]); only
//! start-up contract violations (bad config, missing credential,
//! unreadable input *file*) surface as `Err`. A document that defeats
//! every tier produces `Ok` with zero questions — the upload flow must be
//! able to say "0 questions found" without a server error.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionMethod, ExtractionOutput, ExtractionStats, Question, SourcePage};
use crate::pipeline::{classify, direct, ocr, parse, render, structure::StructuringClient};
use crate::prompts;
use std::path::Path;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Outcome of the direct (text-layer) path.
///
/// `Insufficient` and `NoResponse` both route to the image path; they are
/// distinct variants because they are different facts — a sparse text
/// layer is a property of the document, a missing service reply is not —
/// and the logs should say which one sent us down the OCR road.
enum DirectOutcome {
    /// The service replied and the reply was parsed (possibly to zero
    /// questions — that still counts as an answer, not a failure).
    Structured(Vec<Question>),
    /// The text layer was unusable: the document would not open on this
    /// path, or yielded fewer cleaned characters than the threshold.
    Insufficient,
    /// The structuring call produced no usable response.
    NoResponse,
}

/// Extract multiple-choice questions from a PDF given as raw bytes.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ExtractionOutput)` for every processing outcome, including "no
/// questions found". The question list is unvalidated by design — run
/// [`Question::is_well_formed`] before persisting.
///
/// # Errors
/// Only contract violations: [`ExtractError::CredentialMissing`] when no
/// service credential is configured, or internal start-up failures.
///
/// # Example
/// ```rust,no_run
/// use pdf2mcq::{extract, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("exam.pdf")?;
/// let config = ExtractionConfig::from_env();
/// let output = extract(&bytes, &config).await?;
/// println!("{} questions", output.count());
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let client = StructuringClient::new(config)?;

    // ── Step 1: Classify ─────────────────────────────────────────────────
    let pdf_info = classify::classify(bytes).await;
    if let Some(ref cb) = config.progress_callback {
        cb.on_classified(pdf_info.page_count, pdf_info.is_text_based);
    }

    let mut stats = ExtractionStats {
        total_pages: pdf_info.page_count,
        ..Default::default()
    };

    // ── Step 2: Direct path (text-based documents only) ──────────────────
    let direct_questions = if pdf_info.is_text_based {
        match direct_path(bytes, config, &client, &mut stats).await {
            DirectOutcome::Structured(questions) => Some(questions),
            DirectOutcome::Insufficient => {
                info!("Text layer too sparse to use, falling back to image path");
                None
            }
            DirectOutcome::NoResponse => {
                info!("No structuring response on direct path, falling back to image path");
                None
            }
        }
    } else {
        info!("Using image-based extraction");
        None
    };

    // ── Step 3: Image path, with one whole-document retry ────────────────
    let questions = match direct_questions {
        Some(questions) => questions,
        None => match image_path(bytes, config, &client, &mut stats).await {
            Ok(questions) => questions,
            Err(e) => {
                warn!("Image path failed ({e}), retrying once from scratch");
                stats.skipped_pages = 0;
                match image_path(bytes, config, &client, &mut stats).await {
                    Ok(questions) => questions,
                    Err(e) => {
                        tracing::error!("All extraction methods failed: {e}");
                        Vec::new()
                    }
                }
            }
        },
    };

    // ── Step 4: Assemble output ──────────────────────────────────────────
    stats.direct_questions = questions
        .iter()
        .filter(|q| q.extraction_method == ExtractionMethod::Direct)
        .count();
    stats.ocr_questions = questions
        .iter()
        .filter(|q| q.extraction_method == ExtractionMethod::Ocr)
        .count();
    stats.with_pattern = questions.iter().filter(|q| q.pattern_detected.is_some()).count();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    if questions.is_empty() {
        info!("No questions extracted ({} ms)", stats.total_duration_ms);
    } else {
        info!(
            "Extracted {} questions ({} direct, {} ocr, {} with pattern hint, {} ms)",
            questions.len(),
            stats.direct_questions,
            stats.ocr_questions,
            stats.with_pattern,
            stats.total_duration_ms
        );
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(questions.len());
    }

    Ok(ExtractionOutput { questions, stats })
}

/// Extract questions from a PDF file on disk.
///
/// Validates existence, readability, and the `%PDF` magic bytes before
/// handing the buffer to [`extract`].
pub async fn extract_from_file(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let path = path.as_ref();

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(ExtractError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    extract(&bytes, config).await
}

/// Extract questions and write them to a JSON file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let output = extract_from_file(input_path, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| ExtractError::Internal(format!("Serialisation failed: {e}")))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

// ── Internal paths ───────────────────────────────────────────────────────

/// The direct path: whole text layer → one structuring call.
async fn direct_path(
    bytes: &[u8],
    config: &ExtractionConfig,
    client: &StructuringClient,
    stats: &mut ExtractionStats,
) -> DirectOutcome {
    let text = match direct::extract_text(bytes).await {
        Ok(text) => text,
        Err(e) => {
            // Classification said text-based but the document would not
            // open on this path; the image path gets its own attempt.
            warn!("Direct extraction failed: {e}");
            return DirectOutcome::Insufficient;
        }
    };

    if text.cleaned_text.len() < config.min_direct_text_len {
        debug!(
            "Direct extraction yielded {} chars (< {})",
            text.cleaned_text.len(),
            config.min_direct_text_len
        );
        return DirectOutcome::Insufficient;
    }

    let prompt = prompts::structuring_prompt(
        &text.cleaned_text,
        text.answer_marker,
        SourcePage::WholeDocument,
        ExtractionMethod::Direct,
        config.prompt_excerpt_chars,
    );

    let service_start = Instant::now();
    let response = client.complete(&prompt, "document").await;
    stats.service_duration_ms += service_start.elapsed().as_millis() as u64;

    match response {
        Some(reply) => {
            let questions = parse::parse_questions(
                &reply,
                text.answer_marker,
                ExtractionMethod::Direct,
                SourcePage::WholeDocument,
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_unit_complete(0, stats.total_pages, questions.len());
            }
            DirectOutcome::Structured(questions)
        }
        None => DirectOutcome::NoResponse,
    }
}

/// The image path: per page, strictly in order — render, OCR, prompt,
/// structure, parse — with a fixed delay between page iterations.
async fn image_path(
    bytes: &[u8],
    config: &ExtractionConfig,
    client: &StructuringClient,
    stats: &mut ExtractionStats,
) -> Result<Vec<Question>, ExtractError> {
    let total_pages = render::page_count(bytes).await?;
    stats.total_pages = stats.total_pages.max(total_pages);
    info!("Image path: {} pages to process", total_pages);

    let mut questions = Vec::new();

    for page_number in 1..=total_pages {
        if page_number > 1 {
            // Rate-limit courtesy between page-level service calls; also
            // applies after skipped pages so page cadence stays constant.
            sleep(Duration::from_millis(config.inter_page_delay_ms)).await;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_number, total_pages);
        }

        // Render failure is fatal to the whole image path: a missing
        // bitmap cannot be partially recovered the way a text layer can.
        let image = render::render_page(bytes, page_number, config.render_scale).await?;
        let text = ocr::recognize_page(image, &config.ocr_language).await;

        if text.cleaned_text.len() < config.min_page_text_len {
            debug!(
                "Page {}: {} chars of OCR text (< {}), skipping",
                page_number,
                text.cleaned_text.len(),
                config.min_page_text_len
            );
            stats.skipped_pages += 1;
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_skipped(page_number, total_pages);
            }
            continue;
        }

        let prompt = prompts::structuring_prompt(
            &text.cleaned_text,
            text.answer_marker,
            SourcePage::Page(page_number),
            ExtractionMethod::Ocr,
            config.prompt_excerpt_chars,
        );

        let service_start = Instant::now();
        let response = client.complete(&prompt, &format!("page {page_number}")).await;
        stats.service_duration_ms += service_start.elapsed().as_millis() as u64;

        let page_questions = match response {
            Some(reply) => parse::parse_questions(
                &reply,
                text.answer_marker,
                ExtractionMethod::Ocr,
                SourcePage::Page(page_number),
            ),
            // No response for this page: it contributes zero questions and
            // the loop continues — page-level service failures are not
            // fatal the way render failures are.
            None => Vec::new(),
        };

        debug!("Page {}: {} questions", page_number, page_questions.len());
        if let Some(ref cb) = config.progress_callback {
            cb.on_unit_complete(page_number, total_pages, page_questions.len());
        }
        questions.extend(page_questions);
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credential_fails_before_any_work() {
        let config = ExtractionConfig::default();
        let result = extract(b"%PDF-1.4 ...", &config).await;
        assert!(matches!(result, Err(ExtractError::CredentialMissing)));
    }

    #[tokio::test]
    async fn nonexistent_file_is_reported() {
        let config = ExtractionConfig::builder().api_key("sk-test").build().unwrap();
        let result = extract_from_file("/definitely/not/a/real/file.pdf", &config).await;
        assert!(matches!(result, Err(ExtractError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn non_pdf_magic_is_rejected() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK\x03\x04 this is a zip").unwrap();

        let config = ExtractionConfig::builder().api_key("sk-test").build().unwrap();
        let result = extract_from_file(file.path(), &config).await;
        assert!(matches!(result, Err(ExtractError::NotAPdf { .. })));
    }
}
