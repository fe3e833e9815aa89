//! The PDF decoding capability and its pdfium implementation.
//!
//! The rest of the crate never touches pdfium directly: it sees a
//! [`DocumentDecoder`] that opens a byte buffer and lends out a
//! [`DecodedDocument`] for the duration of a closure. Lending instead of
//! returning keeps pdfium's borrowed document handle on the thread that
//! opened it, which is what pdfium requires.

use crate::error::GiftBookError;
use crate::pipeline::stamp::{digit_advance, DigitGlyphs, DESCENT_EM};
use image::{GrayImage, Luma, RgbaImage};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, warn};

/// An opened document that can rasterise its pages.
///
/// Page indices are 0-based.
pub trait DecodedDocument {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page size in PDF points (1/72 inch).
    fn page_size(&self, index: usize) -> Result<(f32, f32), GiftBookError>;

    /// Render a page onto a fresh surface of `page_size × scale` pixels.
    fn render_page(&self, index: usize, scale: f32) -> Result<RgbaImage, GiftBookError>;

    /// Bold sans-serif digits at `font_px`, for the page-number stamp.
    ///
    /// `None` means no text engine is available and the built-in face is used.
    fn digit_glyphs(&self, font_px: u32) -> Option<DigitGlyphs> {
        let _ = font_px;
        None
    }
}

/// Opens PDF bytes. Implementations must be shareable with the blocking
/// render thread.
pub trait DocumentDecoder: Send + Sync {
    /// Open `bytes` and hand the document to `visit`.
    ///
    /// Fails with a decode-class error when the bytes are not a readable PDF;
    /// errors returned by `visit` are passed through unchanged.
    fn open(
        &self,
        name: &str,
        bytes: &[u8],
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn DecodedDocument) -> Result<(), GiftBookError>,
    ) -> Result<(), GiftBookError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`DocumentDecoder`] backed by the pdfium shared library.
///
/// pdfium is bound on the calling thread each time a document is opened, so
/// the decoder itself holds no library handle and is freely `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumDecoder {
    library_path: Option<PathBuf>,
}

impl PdfiumDecoder {
    /// Use the standard lookup order of [`pdfium_locate`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific pdfium library file.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Check that pdfium can be bound, without opening anything.
    pub fn ensure_available(&self) -> Result<(), GiftBookError> {
        self.bind().map(drop)
    }

    fn bind(&self) -> Result<Pdfium, GiftBookError> {
        pdfium_locate::bind_pdfium(self.library_path.as_deref())
            .map_err(|e| GiftBookError::PdfiumBindingFailed(e.to_string()))
    }

    /// The library file the decoder will bind, if one is found on disk.
    pub fn resolved_library(&self) -> Option<PathBuf> {
        pdfium_locate::find_pdfium_library(self.library_path.as_deref())
    }
}

impl DocumentDecoder for PdfiumDecoder {
    fn open(
        &self,
        name: &str,
        bytes: &[u8],
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn DecodedDocument) -> Result<(), GiftBookError>,
    ) -> Result<(), GiftBookError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let detail = format!("{:?}", e);
                if detail.contains("Password") || detail.contains("password") {
                    GiftBookError::PasswordRequired {
                        name: name.to_string(),
                    }
                } else {
                    GiftBookError::CorruptPdf {
                        name: name.to_string(),
                        detail,
                    }
                }
            })?;

        let doc = PdfiumDocument {
            name: name.to_string(),
            pdfium: &pdfium,
            document,
        };
        debug!("Opened '{}' with pdfium: {} pages", name, doc.page_count());
        visit(&doc)
    }
}

struct PdfiumDocument<'a> {
    name: String,
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, GiftBookError> {
        let idx = u16::try_from(index).map_err(|_| self.render_error(index, "page index overflow"))?;
        self.document
            .pages()
            .get(idx)
            .map_err(|e| self.render_error(index, &format!("{:?}", e)))
    }

    /// Typeset each digit in Helvetica-Bold on a scratch page one digit cell
    /// in size and keep the rendered ink as coverage.
    fn typeset_digits(&self, font_px: u32) -> Result<DigitGlyphs, GiftBookError> {
        let glyph_err =
            |e: PdfiumError| GiftBookError::Internal(format!("digit typesetting: {:?}", e));
        let advance = digit_advance(font_px);
        let mut scratch = self.pdfium.create_new_pdf().map_err(glyph_err)?;
        let font = scratch.fonts_mut().helvetica_bold();
        let render = PdfRenderConfig::new()
            .set_target_size(advance as Pixels, font_px as Pixels)
            .set_clear_color(PdfColor::WHITE);

        let mut masks = Vec::with_capacity(10);
        for digit in 0..10u32 {
            let mut page = scratch
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::Custom(
                    PdfPoints::new(advance as f32),
                    PdfPoints::new(font_px as f32),
                ))
                .map_err(glyph_err)?;
            page.objects_mut()
                .create_text_object(
                    PdfPoints::new(0.0),
                    PdfPoints::new(font_px as f32 * DESCENT_EM),
                    digit.to_string(),
                    font,
                    PdfPoints::new(font_px as f32),
                )
                .map_err(glyph_err)?;
            let ink = page
                .render_with_config(&render)
                .map_err(glyph_err)?
                .as_image()
                .into_luma8();
            masks.push(GrayImage::from_fn(advance, font_px, |x, y| {
                if x < ink.width() && y < ink.height() {
                    Luma([255 - ink.get_pixel(x, y)[0]])
                } else {
                    Luma([0])
                }
            }));
        }

        DigitGlyphs::new(font_px, masks)
    }

    fn render_error(&self, index: usize, detail: &str) -> GiftBookError {
        GiftBookError::RenderFailed {
            name: self.name.clone(),
            page: index + 1,
            detail: detail.to_string(),
        }
    }
}

impl DecodedDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), GiftBookError> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<RgbaImage, GiftBookError> {
        let page = self.page(index)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| self.render_error(index, &format!("{:?}", e)))?;
        Ok(bitmap.as_image().into_rgba8())
    }

    fn digit_glyphs(&self, font_px: u32) -> Option<DigitGlyphs> {
        match self.typeset_digits(font_px) {
            Ok(glyphs) => Some(glyphs),
            Err(e) => {
                warn!("Helvetica-Bold digits unavailable at {}px: {}", font_px, e);
                None
            }
        }
    }
}
