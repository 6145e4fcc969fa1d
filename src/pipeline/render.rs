//! Page rasterisation: render one page to a white-backed PNG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a thread
//! pool designed for blocking operations, so the async worker threads
//! never stall during CPU-heavy rendering.
//!
//! ## Why one page per call?
//!
//! The image path processes pages strictly in sequence — rasterise, OCR,
//! prompt, parse, then the next page — so only one bitmap is ever
//! resident. Re-opening the document per page costs a little parsing
//! time, which the enforced inter-page service delay dwarfs anyway.
//!
//! ## Why flatten onto white?
//!
//! Scanned PDFs can carry transparent regions; rendered as-is those
//! come out black in the PNG and OCR reads them as dense noise. Alpha is
//! composited onto a white background before encoding.

use crate::error::ExtractError;
use crate::pipeline::{bind_pdfium, PageImage};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Count the document's pages without rendering anything.
pub async fn page_count(bytes: &[u8]) -> Result<usize, ExtractError> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&owned, None)
            .map_err(|e| ExtractError::Internal(format!("Failed to open PDF: {e:?}")))?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Page-count task panicked: {e}")))?
}

/// Rasterise one page (1-based) at the given scale factor.
///
/// # Errors
/// Any failure here is fatal to the image path for this document — a
/// missing bitmap cannot be partially recovered the way a missing text
/// layer can — and propagates as [`ExtractError::RasterisationFailed`].
pub async fn render_page(
    bytes: &[u8],
    page_number: usize,
    scale: f32,
) -> Result<PageImage, ExtractError> {
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || render_page_blocking(&owned, page_number, scale))
        .await
        .map_err(|e| ExtractError::Internal(format!("Render task panicked: {e}")))?
}

/// Blocking implementation of single-page rendering.
fn render_page_blocking(
    bytes: &[u8],
    page_number: usize,
    scale: f32,
) -> Result<PageImage, ExtractError> {
    if page_number == 0 {
        return Err(ExtractError::RasterisationFailed {
            page: 0,
            detail: "page numbers are 1-based".to_string(),
        });
    }

    let pdfium = bind_pdfium()?;
    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        ExtractError::RasterisationFailed {
            page: page_number,
            detail: format!("Failed to open PDF: {e:?}"),
        }
    })?;

    let pages = document.pages();
    let page = pages
        .get((page_number - 1) as u16)
        .map_err(|e| ExtractError::RasterisationFailed {
            page: page_number,
            detail: format!("{e:?}"),
        })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExtractError::RasterisationFailed {
            page: page_number,
            detail: format!("{e:?}"),
        })?;

    let image = flatten_onto_white(bitmap.as_image());
    let (width, height) = (image.width(), image.height());

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ExtractError::RasterisationFailed {
            page: page_number,
            detail: format!("PNG encoding failed: {e}"),
        })?;

    debug!(
        "Rendered page {} → {}x{} px, {} PNG bytes",
        page_number,
        width,
        height,
        png.len()
    );

    Ok(PageImage {
        page_number,
        png,
        width,
        height,
    })
}

/// Composite any transparent pixels onto a white background.
fn flatten_onto_white(image: DynamicImage) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for px in rgba.pixels_mut() {
        let alpha = px[3] as u32;
        if alpha < 255 {
            for channel in 0..3 {
                let c = px[channel] as u32;
                px[channel] = ((c * alpha + 255 * (255 - alpha)) / 255) as u8;
            }
            px[3] = 255;
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn fully_transparent_pixel_becomes_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let flat = flatten_onto_white(img).to_rgba8();
        assert_eq!(flat.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn opaque_pixel_is_untouched() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])));
        let flat = flatten_onto_white(img).to_rgba8();
        assert_eq!(flat.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn half_transparent_pixel_is_blended() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128])));
        let flat = flatten_onto_white(img).to_rgba8();
        let px = flat.get_pixel(0, 0);
        // Black at ~50% alpha over white lands mid-grey.
        assert!(px[0] > 100 && px[0] < 150, "got {px:?}");
        assert_eq!(px[3], 255);
    }

    #[tokio::test]
    async fn rendering_garbage_bytes_fails() {
        let result = render_page(b"not a pdf", 1, 2.5).await;
        assert!(matches!(
            result,
            Err(ExtractError::RasterisationFailed { page: 1, .. })
                | Err(ExtractError::PdfiumBindingFailed(_))
        ));
    }
}
