//! Image encoding: rendered pages → PNG bytes or PNG data URIs.
//!
//! PNG keeps the stamped numerals and small print lossless. Data URIs let an
//! exported manifest carry its pages inline, the same way a hosting page
//! embeds book data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!("Encoded {}x{} page → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a rendered page as a `data:image/png;base64,…` URI.
pub fn encode_data_uri(img: &RgbaImage) -> Result<String, image::ImageError> {
    let png = encode_png(img)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}
