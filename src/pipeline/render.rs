//! Page rasterisation: one PDF source → ordered, page-numbered images.
//!
//! pdfium is CPU-bound and not async-safe, so [`render_source`] moves the
//! whole source onto `spawn_blocking` and the blocking
//! [`rasterize_source`] does the work. One source is decoded at a time; the
//! async caller awaits each source before starting the next.

use crate::config::{GiftBookConfig, PageNumbering, StampStyle};
use crate::error::GiftBookError;
use crate::pipeline::decode::{DecodedDocument, DocumentDecoder};
use crate::pipeline::input::check_pdf_magic;
use crate::pipeline::stamp::{font_size_for, stamp_page_number_with, DigitGlyphs};
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, info};

/// The subset of [`GiftBookConfig`] the rasteriser needs, cheap to move
/// into a blocking task.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    pub stamp: StampStyle,
    pub numbering: PageNumbering,
    pub password: Option<String>,
}

impl From<&GiftBookConfig> for RasterOptions {
    fn from(c: &GiftBookConfig) -> Self {
        Self {
            scale: c.scale,
            stamp: c.stamp,
            numbering: c.numbering,
            password: c.password.clone(),
        }
    }
}

/// Rasterise every page of one source, in document order.
///
/// `pages_before` is the number of pages already in the book, used only by
/// [`PageNumbering::Continuous`]. `on_page(current, total)` fires before each
/// page is rendered, with a 1-based `current`.
///
/// # Returns
/// `(page_number, image)` for each page; `page_number` is the stamped numeral.
pub fn rasterize_source(
    decoder: &dyn DocumentDecoder,
    name: &str,
    bytes: &[u8],
    opts: &RasterOptions,
    pages_before: usize,
    on_page: &mut dyn FnMut(usize, usize),
) -> Result<Vec<(usize, RgbaImage)>, GiftBookError> {
    check_pdf_magic(name, bytes)?;

    let mut results = Vec::new();
    decoder.open(name, bytes, opts.password.as_deref(), &mut |doc: &dyn DecodedDocument| {
        let total = doc.page_count();
        info!("'{}' loaded: {} pages", name, total);
        results.reserve(total);
        // Pages of one source usually share a height, hence a font size.
        let mut face: Option<DigitGlyphs> = None;

        for i in 1..=total {
            on_page(i, total);

            let mut image = doc.render_page(i - 1, opts.scale)?;
            let number = opts.numbering.number_for(i, pages_before);
            let font_px = font_size_for(image.height(), &opts.stamp) as u32;
            if opts.stamp.enabled && font_px > 0 {
                let glyphs = match face.take() {
                    Some(g) if g.font_px() == font_px => g,
                    _ => doc
                        .digit_glyphs(font_px)
                        .unwrap_or_else(|| DigitGlyphs::builtin(font_px)),
                };
                stamp_page_number_with(&mut image, number, &opts.stamp, &glyphs);
                face = Some(glyphs);
            }
            debug!(
                "Rendered '{}' page {} → {}x{} px",
                name,
                i,
                image.width(),
                image.height()
            );
            results.push((number, image));
        }
        Ok(())
    })?;

    Ok(results)
}

/// Async wrapper running [`rasterize_source`] on the blocking pool.
pub async fn render_source(
    decoder: Arc<dyn DocumentDecoder>,
    name: String,
    bytes: Vec<u8>,
    opts: RasterOptions,
    pages_before: usize,
    mut on_page: impl FnMut(usize, usize) + Send + 'static,
) -> Result<Vec<(usize, RgbaImage)>, GiftBookError> {
    tokio::task::spawn_blocking(move || {
        rasterize_source(
            decoder.as_ref(),
            &name,
            &bytes,
            &opts,
            pages_before,
            &mut on_page,
        )
    })
    .await
    .map_err(|e| GiftBookError::Internal(format!("Render task panicked: {}", e)))?
}
