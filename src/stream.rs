//! Streaming ingestion API: progress as a `Stream` of events.
//!
//! [`ingest_events`] runs [`crate::ingest::ingest`] on a spawned task and
//! turns its progress callbacks into [`IngestEvent`]s. The stream ends with
//! exactly one [`IngestEvent::Finished`] or [`IngestEvent::Failed`]. Events
//! arrive in order because sources are rendered one at a time.

use crate::config::GiftBookConfig;
use crate::error::GiftBookError;
use crate::ingest;
use crate::output::Book;
use crate::pipeline::decode::DocumentDecoder;
use crate::pipeline::input::DocumentSource;
use crate::progress::{IngestProgressCallback, ProgressCallback};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// One step of an ingestion.
#[derive(Debug)]
pub enum IngestEvent {
    /// Sources were sorted; `total_sources` will be rendered.
    Started { total_sources: usize },
    /// A source is about to be read.
    SourceStarted {
        source_num: usize,
        total_sources: usize,
        name: String,
    },
    /// A page is about to be rendered.
    PageStarted {
        source_num: usize,
        total_sources: usize,
        name: String,
        page_num: usize,
        total_pages: usize,
    },
    /// A source finished with `page_count` pages.
    SourceFinished {
        source_num: usize,
        total_sources: usize,
        page_count: usize,
    },
    /// The whole book.
    Finished(Book),
    /// Ingestion aborted; no pages are kept.
    Failed(GiftBookError),
}

impl IngestEvent {
    /// `true` for [`Finished`](Self::Finished) and [`Failed`](Self::Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestEvent::Finished(_) | IngestEvent::Failed(_))
    }
}

/// A boxed stream of ingestion events.
pub type IngestEventStream = Pin<Box<dyn Stream<Item = IngestEvent> + Send>>;

struct ChannelProgress {
    tx: UnboundedSender<IngestEvent>,
    inner: Option<ProgressCallback>,
}

impl ChannelProgress {
    fn send(&self, event: IngestEvent) {
        // The receiver may have been dropped; ingestion carries on regardless.
        let _ = self.tx.send(event);
    }
}

impl IngestProgressCallback for ChannelProgress {
    fn on_ingest_start(&self, total_sources: usize) {
        self.send(IngestEvent::Started { total_sources });
        if let Some(cb) = &self.inner {
            cb.on_ingest_start(total_sources);
        }
    }

    fn on_source_start(&self, source_num: usize, total_sources: usize, name: &str) {
        self.send(IngestEvent::SourceStarted {
            source_num,
            total_sources,
            name: name.to_string(),
        });
        if let Some(cb) = &self.inner {
            cb.on_source_start(source_num, total_sources, name);
        }
    }

    fn on_page_start(
        &self,
        source_num: usize,
        total_sources: usize,
        name: &str,
        page_num: usize,
        total_pages: usize,
    ) {
        self.send(IngestEvent::PageStarted {
            source_num,
            total_sources,
            name: name.to_string(),
            page_num,
            total_pages,
        });
        if let Some(cb) = &self.inner {
            cb.on_page_start(source_num, total_sources, name, page_num, total_pages);
        }
    }

    fn on_source_complete(&self, source_num: usize, total_sources: usize, page_count: usize) {
        self.send(IngestEvent::SourceFinished {
            source_num,
            total_sources,
            page_count,
        });
        if let Some(cb) = &self.inner {
            cb.on_source_complete(source_num, total_sources, page_count);
        }
    }

    fn on_ingest_complete(&self, total_sources: usize, total_pages: usize) {
        if let Some(cb) = &self.inner {
            cb.on_ingest_complete(total_sources, total_pages);
        }
    }

    fn on_ingest_error(&self, error: &str) {
        if let Some(cb) = &self.inner {
            cb.on_ingest_error(error);
        }
    }
}

/// Ingest `sources`, reporting progress as a stream.
///
/// Must be called inside a tokio runtime. Dropping the stream does not stop
/// the ingestion task; its events are discarded.
///
/// # Example
/// ```rust,no_run
/// use giftbook::{ingest_events, DocumentSource, GiftBookConfig, IngestEvent, PdfiumDecoder};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let sources = vec![DocumentSource::from_path("parte 1.pdf")];
/// let mut events = ingest_events(sources, Arc::new(PdfiumDecoder::new()), &GiftBookConfig::default());
/// while let Some(event) = events.next().await {
///     match event {
///         IngestEvent::PageStarted { name, page_num, total_pages, .. } => {
///             eprintln!("{name}: {page_num}/{total_pages}")
///         }
///         IngestEvent::Finished(book) => println!("{} pages", book.len()),
///         IngestEvent::Failed(e) => eprintln!("Error: {e}"),
///         _ => {}
///     }
/// }
/// # }
/// ```
pub fn ingest_events(
    sources: Vec<DocumentSource>,
    decoder: Arc<dyn DocumentDecoder>,
    config: &GiftBookConfig,
) -> IngestEventStream {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut config = config.clone();
    let inner = config.progress_callback.take();
    config.progress_callback = Some(Arc::new(ChannelProgress {
        tx: tx.clone(),
        inner,
    }));

    tokio::spawn(async move {
        let last = match ingest::ingest(sources, decoder, &config).await {
            Ok(book) => IngestEvent::Finished(book),
            Err(e) => IngestEvent::Failed(e),
        };
        debug!("Ingestion task done");
        let _ = tx.send(last);
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}
