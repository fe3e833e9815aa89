//! Progress-callback trait for ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::GiftBookConfigBuilder::progress_callback`]. Sources are
//! processed one at a time, so events arrive strictly in order: a source
//! start, its pages, its completion, then the next source. Page events are
//! fired from the blocking render thread, hence `Send + Sync`.
//!
//! # Example
//!
//! ```rust
//! use giftbook::{GiftBookConfig, IngestProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl IngestProgressCallback for Printer {
//!     fn on_page_start(&self, source: usize, sources: usize, name: &str, page: usize, pages: usize) {
//!         eprintln!("{source}/{sources} {name}: page {page}/{pages}");
//!     }
//! }
//!
//! let config = GiftBookConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Receives ingestion progress. All methods default to no-ops.
///
/// Source and page numbers are 1-indexed.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once, after filtering and sorting, before any source is read.
    fn on_ingest_start(&self, total_sources: usize) {
        let _ = total_sources;
    }

    /// Called before a source's bytes are read.
    fn on_source_start(&self, source_num: usize, total_sources: usize, name: &str) {
        let _ = (source_num, total_sources, name);
    }

    /// Called before each page is rendered.
    fn on_page_start(
        &self,
        source_num: usize,
        total_sources: usize,
        name: &str,
        page_num: usize,
        total_pages: usize,
    ) {
        let _ = (source_num, total_sources, name, page_num, total_pages);
    }

    /// Called after every page of a source has been rendered.
    fn on_source_complete(&self, source_num: usize, total_sources: usize, page_count: usize) {
        let _ = (source_num, total_sources, page_count);
    }

    /// Called once when the whole book is assembled.
    fn on_ingest_complete(&self, total_sources: usize, total_pages: usize) {
        let _ = (total_sources, total_pages);
    }

    /// Called once when ingestion aborts.
    fn on_ingest_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GiftBookConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;
