//! Pipeline stages for turning PDF sources into page images.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ render ──▶ stamp ──▶ encode
//! (sources)  (pdfium)  (scale)   (numeral)  (PNG)
//! ```
//!
//! 1. [`input`]: build, order and filter [`input::DocumentSource`]s from
//!    paths, buffers or embedded data URIs
//! 2. [`decode`]: the [`decode::DocumentDecoder`] capability and its pdfium
//!    implementation
//! 3. [`render`]: rasterise every page of one source on the blocking pool
//! 4. [`stamp`]: draw the page number into each image
//! 5. [`encode`]: PNG bytes / data URIs for export

pub mod decode;
pub mod encode;
pub mod input;
pub mod render;
pub mod stamp;
