//! Shared fixtures: a scripted [`DocumentDecoder`] and matching PDF stand-ins.
//!
//! A fake PDF is `%PDF-fake` followed by `key=value` lines:
//! `pages=N` (page count), `fail=K` (1-based page whose render fails) and
//! `locked` (needs a password). Pages are 200×400 points of plain white.

#![allow(dead_code)]

use giftbook::config::StampStyle;
use giftbook::pipeline::stamp::stamp_page_number;
use giftbook::{DecodedDocument, DocumentDecoder, DocumentSource, GiftBookConfig, GiftBookError};
use image::{Rgba, RgbaImage};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const PAGE_POINTS: (f32, f32) = (200.0, 400.0);

#[derive(Debug, Default)]
pub struct FakeDecoder {
    /// Names of the documents opened, in order.
    pub opened: Mutex<Vec<String>>,
}

struct FakeDoc {
    name: String,
    pages: usize,
    fail_on: Option<usize>,
}

impl DecodedDocument for FakeDoc {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_size(&self, _index: usize) -> Result<(f32, f32), GiftBookError> {
        Ok(PAGE_POINTS)
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<RgbaImage, GiftBookError> {
        if self.fail_on == Some(index + 1) {
            return Err(GiftBookError::RenderFailed {
                name: self.name.clone(),
                page: index + 1,
                detail: "scripted failure".into(),
            });
        }
        let (w, h) = PAGE_POINTS;
        Ok(white((w * scale) as u32, (h * scale) as u32))
    }
}

impl DocumentDecoder for FakeDecoder {
    fn open(
        &self,
        name: &str,
        bytes: &[u8],
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn DecodedDocument) -> Result<(), GiftBookError>,
    ) -> Result<(), GiftBookError> {
        self.opened.lock().unwrap().push(name.to_string());

        let text = String::from_utf8_lossy(bytes);
        let mut doc = FakeDoc {
            name: name.to_string(),
            pages: 0,
            fail_on: None,
        };
        let mut locked = false;
        for line in text.lines().skip(1) {
            match line.split_once('=') {
                Some(("pages", n)) => doc.pages = n.parse().unwrap(),
                Some(("fail", k)) => doc.fail_on = Some(k.parse().unwrap()),
                _ if line == "locked" => locked = true,
                _ => {
                    return Err(GiftBookError::CorruptPdf {
                        name: name.to_string(),
                        detail: format!("unexpected line {line:?}"),
                    })
                }
            }
        }
        if locked && password.is_none() {
            return Err(GiftBookError::PasswordRequired {
                name: name.to_string(),
            });
        }
        visit(&doc)
    }
}

/// Show `warn!`/`error!` output from the library in failing tests.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("giftbook=warn"))
        .with_test_writer()
        .try_init();
}

pub fn white(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
}

pub fn fake_pdf(pages: usize) -> Vec<u8> {
    format!("%PDF-fake\npages={pages}").into_bytes()
}

pub fn failing_pdf(pages: usize, fail_page: usize) -> Vec<u8> {
    format!("%PDF-fake\npages={pages}\nfail={fail_page}").into_bytes()
}

pub fn pdf_source(name: &str, pages: usize) -> DocumentSource {
    DocumentSource::from_bytes(name, Some("application/pdf"), fake_pdf(pages))
}

/// Config rendering one pixel per point, to keep fixtures small.
pub fn small_config() -> GiftBookConfig {
    GiftBookConfig::builder().scale(1.0).build().unwrap()
}

/// What a blank page stamped with `number` looks like.
pub fn expected_page(number: usize, style: &StampStyle) -> RgbaImage {
    let (w, h) = PAGE_POINTS;
    let mut img = white(w as u32, h as u32);
    stamp_page_number(&mut img, number, style);
    img
}

/// `data:application/pdf;base64,…` for a fake PDF.
pub fn data_uri(pages: usize) -> String {
    use base64::Engine as _;
    format!(
        "data:application/pdf;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(fake_pdf(pages))
    )
}
