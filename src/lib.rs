//! # giftbook
//!
//! Turn a handful of PDF files into one page-numbered, page-flip gift book.
//!
//! Every page of every PDF is rasterised with pdfium, stamped with its page
//! number near the bottom edge and appended to a single book, which is then
//! handed to a page-flip widget. Readers can flip, jump to a page, zoom and
//! bookmark pages; bookmarks persist in a small key-value store.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs (files, bytes or embedded data URIs)
//!  │
//!  ├─ 1. Input   natural-sort by name, keep application/pdf only
//!  ├─ 2. Render  one source at a time via pdfium (spawn_blocking), 2.5×
//!  ├─ 3. Stamp   page number, bottom centre, #333
//!  ├─ 4. Concat  sources in order into one Book
//!  └─ 5. Widget  PageFlipWidget::load(pages, FlipBookConfig::responsive(..))
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use giftbook::{ingest, DocumentSource, GiftBookConfig, PdfiumDecoder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sources = vec![
//!         DocumentSource::from_path("capitulo 10.pdf"),
//!         DocumentSource::from_path("capitulo 2.pdf"),
//!     ];
//!     let book = ingest(sources, Arc::new(PdfiumDecoder::new()), &GiftBookConfig::default()).await?;
//!     println!("{} pages, stamped {:?}", book.len(), book.page_numbers());
//!     Ok(())
//! }
//! ```
//!
//! For an interactive reader, drive a [`ViewerSession`] instead.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `giftbook` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! giftbook = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod ingest;
pub mod messages;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod stream;
pub mod widget;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use bookmarks::{BookmarkSet, FileStore, KeyValueStore, MemoryStore};
pub use config::{GiftBookConfig, GiftBookConfigBuilder, PageNumbering, StampStyle};
pub use error::{ErrorKind, GiftBookError};
pub use ingest::{
    ingest, ingest_embedded, ingest_sync, ingest_uploads, inspect, inspect_embedded,
    inspect_uploads, SourceSummary,
};
pub use messages::Locale;
pub use output::{Book, IngestStats, RenderedPage};
pub use pipeline::decode::{DecodedDocument, DocumentDecoder, PdfiumDecoder};
pub use pipeline::input::{natural_cmp, DocumentSource, SourceData};
pub use progress::{IngestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{Screen, ViewerSession, WidgetFactory, Zoom};
pub use stream::{ingest_events, IngestEvent, IngestEventStream};
pub use widget::{
    ExportFlipBook, ExportManifest, FlipBookConfig, MemoryFlipBook, PageFlipWidget, Viewport,
};
