//! Ingestion: many PDF sources → one ordered, page-numbered book.
//!
//! Sources are ordered by display name, then read and rasterised strictly one
//! after another, so only one decoded document is ever held in memory. The first
//! failure aborts the whole book and every page rendered so far is dropped.

use crate::config::GiftBookConfig;
use crate::error::GiftBookError;
use crate::output::{Book, IngestStats, RenderedPage};
use crate::pipeline::decode::{DecodedDocument, DocumentDecoder};
use crate::pipeline::input::{self, sort_natural, DocumentSource};
use crate::pipeline::render::{self, RasterOptions};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Render `sources` into a single book.
///
/// Sources are sorted with [`input::natural_cmp`] but not filtered; use
/// [`ingest_uploads`] for a raw file-picker selection.
///
/// # Errors
/// The first decode, read or render failure, unchanged. No partial book is
/// ever returned.
pub async fn ingest(
    mut sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    config: &GiftBookConfig,
) -> Result<Book, GiftBookError> {
    if sources.is_empty() {
        return Err(GiftBookError::NoPdfSelected { total: 0 });
    }
    sort_natural(&mut sources);

    let cb = config.progress_callback.clone();
    let result = ingest_sorted(sources, decoder, config, cb.clone()).await;

    if let (Err(e), Some(cb)) = (&result, &cb) {
        cb.on_ingest_error(&e.to_string());
    }
    result
}

async fn ingest_sorted(
    sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    config: &GiftBookConfig,
    cb: Option<ProgressCallback>,
) -> Result<Book, GiftBookError> {
    let total_start = Instant::now();
    let total_sources = sources.len();
    let opts = RasterOptions::from(config);
    info!("Starting ingestion of {} source(s)", total_sources);

    if let Some(ref cb) = cb {
        cb.on_ingest_start(total_sources);
    }

    let mut pages: Vec<RenderedPage> = Vec::new();
    let mut pages_per_source = Vec::with_capacity(total_sources);

    for (i, source) in sources.into_iter().enumerate() {
        let source_num = i + 1;
        let name = source.name.clone();
        info!("Source {}/{}: {}", source_num, total_sources, name);
        if let Some(ref cb) = cb {
            cb.on_source_start(source_num, total_sources, &name);
        }

        let bytes = source.read_bytes().await?;

        let page_cb = cb.clone();
        let page_name = name.clone();
        let rendered = render::render_source(
            Arc::clone(&decoder),
            name.clone(),
            bytes,
            opts.clone(),
            pages.len(),
            move |page, total| {
                if let Some(ref cb) = page_cb {
                    cb.on_page_start(source_num, total_sources, &page_name, page, total);
                }
            },
        )
        .await
        .inspect_err(|e| warn!("Source '{}' failed: {}", name, e))?;

        if rendered.is_empty() {
            warn!("Source '{}' has no pages", name);
        }
        pages_per_source.push(rendered.len());
        if let Some(ref cb) = cb {
            cb.on_source_complete(source_num, total_sources, rendered.len());
        }

        for (k, (page_number, image)) in rendered.into_iter().enumerate() {
            pages.push(RenderedPage {
                index: pages.len(),
                source_index: i,
                page_in_source: k + 1,
                page_number,
                image,
            });
        }
        debug!("Book now has {} pages", pages.len());
    }

    let stats = IngestStats {
        sources: total_sources,
        pages: pages.len(),
        pages_per_source,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Ingestion complete: {} pages from {} source(s) in {}ms",
        stats.pages, stats.sources, stats.total_duration_ms
    );

    if let Some(ref cb) = cb {
        cb.on_ingest_complete(total_sources, stats.pages);
    }

    Ok(Book { pages, stats })
}

/// Ingest a raw file-picker selection: natural-sort, keep only PDFs, render.
pub async fn ingest_uploads(
    sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    config: &GiftBookConfig,
) -> Result<Book, GiftBookError> {
    let sources = input::prepare_uploads(sources)?;
    ingest(sources, decoder, config).await
}

/// Ingest the hosting page's embedded book parts (base64 data URIs).
///
/// Parts are trusted as PDFs and keep their given order.
pub async fn ingest_embedded<S: AsRef<str>>(
    uris: &[S],
    decoder: Arc<dyn DocumentDecoder>,
    config: &GiftBookConfig,
) -> Result<Book, GiftBookError> {
    info!("Auto-loading {} embedded book part(s)", uris.len());
    let sources = input::embedded_sources(uris)?;
    ingest(sources, decoder, config).await
}

/// Synchronous wrapper around [`ingest`].
///
/// Creates a temporary tokio runtime internally.
pub fn ingest_sync(
    sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    config: &GiftBookConfig,
) -> Result<Book, GiftBookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GiftBookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(ingest(sources, decoder, config))
}

// ── Inspection ───────────────────────────────────────────────────────────

/// Page count and first-page size of one source, without rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub page_count: usize,
    /// `(width, height)` of the first page in PDF points.
    pub first_page_points: Option<(f32, f32)>,
}

/// Summarise each source in book order.
pub async fn inspect(
    mut sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    password: Option<String>,
) -> Result<Vec<SourceSummary>, GiftBookError> {
    sort_natural(&mut sources);
    let mut out = Vec::with_capacity(sources.len());

    for source in sources {
        let name = source.name.clone();
        let bytes = source.read_bytes().await?;
        let decoder = Arc::clone(&decoder);
        let password = password.clone();

        let summary = tokio::task::spawn_blocking(move || {
            input::check_pdf_magic(&name, &bytes)?;
            let mut summary = SourceSummary {
                name: name.clone(),
                page_count: 0,
                first_page_points: None,
            };
            decoder.open(&name, &bytes, password.as_deref(), &mut |doc: &dyn DecodedDocument| {
                summary.page_count = doc.page_count();
                if summary.page_count > 0 {
                    summary.first_page_points = Some(doc.page_size(0)?);
                }
                Ok(())
            })?;
            Ok::<_, GiftBookError>(summary)
        })
        .await
        .map_err(|e| GiftBookError::Internal(format!("Inspect task panicked: {}", e)))??;

        out.push(summary);
    }

    Ok(out)
}

/// [`inspect`] a raw file-picker selection, dropping non-PDFs the way
/// [`ingest_uploads`] does.
pub async fn inspect_uploads(
    sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    password: Option<String>,
) -> Result<Vec<SourceSummary>, GiftBookError> {
    let sources = input::prepare_uploads(sources)?;
    inspect(sources, decoder, password).await
}

/// [`inspect`] the hosting page's embedded book parts.
pub async fn inspect_embedded<S: AsRef<str>>(
    uris: &[S],
    decoder: Arc<dyn DocumentDecoder>,
    password: Option<String>,
) -> Result<Vec<SourceSummary>, GiftBookError> {
    let sources = input::embedded_sources(uris)?;
    inspect(sources, decoder, password).await
}
