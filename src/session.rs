//! The viewer: selection screen, loading screen and the open book.
//!
//! [`ViewerSession`] owns everything the hosting page kept in globals: the
//! current screen, the page-flip widget, the zoom level, the page jump input
//! and the bookmark set. The caller drives it with the same actions a reader
//! has on the page.

use crate::bookmarks::{BookmarkSet, KeyValueStore};
use crate::config::GiftBookConfig;
use crate::error::GiftBookError;
use crate::ingest;
use crate::messages::{self, Locale};
use crate::output::{Book, IngestStats};
use crate::pipeline::decode::DocumentDecoder;
use crate::pipeline::input::{self, DocumentSource};
use crate::progress::{IngestProgressCallback, ProgressCallback};
use crate::widget::{FlipBookConfig, MemoryFlipBook, PageFlipWidget, Viewport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

/// Which screen is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Selection,
    Loading,
    Viewer,
}

/// Magnification applied to the book when zoomed in.
pub const ZOOM_IN_FACTOR: f32 = 1.4;

/// CSS transition used for both zoom directions.
pub const ZOOM_TRANSITION: &str = "transform 0.4s ease";

/// The two zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zoom {
    #[default]
    Normal,
    In,
}

impl Zoom {
    pub fn factor(self) -> f32 {
        match self {
            Zoom::Normal => 1.0,
            Zoom::In => ZOOM_IN_FACTOR,
        }
    }

    /// CSS `transform` value for the book container.
    pub fn css_transform(self) -> String {
        format!("scale({:.1})", self.factor())
    }

    /// Cursor shown over the zoomed book, if any.
    pub fn cursor(self) -> Option<&'static str> {
        match self {
            Zoom::Normal => None,
            Zoom::In => Some("grab"),
        }
    }
}

/// Creates a fresh widget for every opened book.
pub type WidgetFactory = Box<dyn Fn() -> Box<dyn PageFlipWidget> + Send + Sync>;

/// Keeps the loading screen text current while a book is ingested.
struct LoadingStatus {
    line: Arc<Mutex<String>>,
    locale: Locale,
    embedded: bool,
    inner: Option<ProgressCallback>,
}

impl LoadingStatus {
    fn set(&self, text: String) {
        *self.line.lock().unwrap_or_else(PoisonError::into_inner) = text;
    }
}

impl IngestProgressCallback for LoadingStatus {
    fn on_ingest_start(&self, total_sources: usize) {
        if let Some(cb) = &self.inner {
            cb.on_ingest_start(total_sources);
        }
    }

    fn on_source_start(&self, source_num: usize, total_sources: usize, name: &str) {
        self.set(if self.embedded {
            messages::embedded_started(self.locale, source_num, total_sources)
        } else {
            messages::source_started(self.locale, source_num, total_sources, name)
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
        self.set(if self.embedded {
            messages::embedded_page_rendering(
                self.locale,
                source_num,
                total_sources,
                page_num,
                total_pages,
            )
        } else {
            messages::page_rendering(
                self.locale,
                source_num,
                total_sources,
                name,
                page_num,
                total_pages,
            )
        });
        if let Some(cb) = &self.inner {
            cb.on_page_start(source_num, total_sources, name, page_num, total_pages);
        }
    }

    fn on_source_complete(&self, source_num: usize, total_sources: usize, page_count: usize) {
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

/// One reader's view of the application.
pub struct ViewerSession {
    decoder: Arc<dyn DocumentDecoder>,
    config: GiftBookConfig,
    viewport: Viewport,
    widget_factory: WidgetFactory,
    widget: Option<Box<dyn PageFlipWidget>>,
    screen: Screen,
    zoom: Zoom,
    bookmarks: BookmarkSet,
    /// 1-based value of the page jump input, kept in step with flips.
    page_input: Arc<AtomicUsize>,
    loading_line: Arc<Mutex<String>>,
    alert: Option<String>,
    stats: Option<IngestStats>,
}

impl ViewerSession {
    /// A session on the selection screen, presenting books with a
    /// [`MemoryFlipBook`] sized for the default viewport.
    pub fn new(
        decoder: Arc<dyn DocumentDecoder>,
        config: GiftBookConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let bookmarks = BookmarkSet::new(store, config.bookmark_key.clone());
        Self {
            decoder,
            config,
            viewport: Viewport::default(),
            widget_factory: Box::new(|| Box::new(MemoryFlipBook::new()) as Box<dyn PageFlipWidget>),
            widget: None,
            screen: Screen::Selection,
            zoom: Zoom::Normal,
            bookmarks,
            page_input: Arc::new(AtomicUsize::new(0)),
            loading_line: Arc::new(Mutex::new(String::new())),
            alert: None,
            stats: None,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_widget_factory(mut self, factory: WidgetFactory) -> Self {
        self.widget_factory = factory;
        self
    }

    // ── Opening a book ───────────────────────────────────────────────────

    /// Open a file-picker selection.
    ///
    /// An empty selection does nothing. A selection without any PDF keeps the
    /// selection screen and raises [`GiftBookError::NoPdfSelected`]. Any
    /// ingestion failure returns to the selection screen.
    pub async fn open_uploads(&mut self, sources: Vec<DocumentSource>) -> Result<(), GiftBookError> {
        if sources.is_empty() {
            return Ok(());
        }
        let sources = match input::prepare_uploads(sources) {
            Ok(s) => s,
            Err(e) => {
                warn!("{}", e);
                self.alert = Some(e.user_message(self.config.locale));
                return Err(e);
            }
        };

        match self.load(sources, false).await {
            Ok(book) => {
                self.show(book);
                Ok(())
            }
            Err(e) => {
                error!("Ingestion failed: {}", e);
                self.alert = Some(e.user_message(self.config.locale));
                self.reset();
                Err(e)
            }
        }
    }

    /// Open the book parts a hosting page embedded as base64 data URIs.
    ///
    /// Nothing happens when there are no parts.
    pub async fn open_embedded<S: AsRef<str>>(&mut self, uris: &[S]) -> Result<(), GiftBookError> {
        if uris.is_empty() {
            return Ok(());
        }
        info!("Auto-loading book data ({} part(s))", uris.len());

        let result = match input::embedded_sources(uris) {
            Ok(sources) => self.load(sources, true).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(book) => {
                self.show(book);
                Ok(())
            }
            Err(e) => {
                error!("Auto-load failed: {}", e);
                self.alert = Some(messages::embedded_failed(self.config.locale, &e.to_string()));
                self.reset();
                Err(e)
            }
        }
    }

    async fn load(
        &mut self,
        sources: Vec<DocumentSource>,
        embedded: bool,
    ) -> Result<Book, GiftBookError> {
        self.alert = None;
        self.screen = Screen::Loading;

        let mut config = self.config.clone();
        config.progress_callback = Some(Arc::new(LoadingStatus {
            line: Arc::clone(&self.loading_line),
            locale: self.config.locale,
            embedded,
            inner: self.config.progress_callback.clone(),
        }));
        ingest::ingest(sources, Arc::clone(&self.decoder), &config).await
    }

    /// Hand the book to a fresh widget and switch to the viewer.
    ///
    /// A widget that refuses the book is logged; the viewer screen still
    /// shows, without a book.
    fn show(&mut self, book: Book) {
        if let Some(mut old) = self.widget.take() {
            old.destroy();
        }

        let first = book.first_page_dimensions().unwrap_or((0, 0));
        let settings = FlipBookConfig::responsive(first, self.viewport);
        self.stats = Some(book.stats.clone());

        let mut widget = (self.widget_factory)();
        match widget.load(book.pages, &settings) {
            Ok(()) => {
                let input = Arc::clone(&self.page_input);
                widget.on_flip(Box::new(move |index| input.store(index + 1, Ordering::SeqCst)));
                self.page_input.store(1, Ordering::SeqCst);
                match self.bookmarks.list() {
                    Ok(marks) => {
                        if let Err(e) = widget.show_bookmarks(&marks) {
                            warn!("Could not show bookmarks: {}", e);
                        }
                    }
                    Err(e) => warn!("Could not read bookmarks: {}", e),
                }
                info!("Book open: {} pages", widget.page_count());
                self.widget = Some(widget);
            }
            Err(e) => {
                error!("Error initialising page-flip widget: {}", e);
                self.page_input.store(0, Ordering::SeqCst);
            }
        }
        self.screen = Screen::Viewer;
    }

    /// Back to the selection screen: drop the book, reset the zoom.
    pub fn reset(&mut self) {
        if let Some(mut widget) = self.widget.take() {
            widget.destroy();
        }
        self.screen = Screen::Selection;
        self.zoom = Zoom::Normal;
        self.page_input.store(0, Ordering::SeqCst);
        self.stats = None;
        self.loading_line
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    // ── Navigation ───────────────────────────────────────────────────────

    pub fn next_page(&mut self) {
        if let Some(w) = self.widget.as_mut() {
            w.flip_next();
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(w) = self.widget.as_mut() {
            w.flip_prev();
        }
    }

    /// Jump to the 1-based page typed into the page input.
    ///
    /// Out-of-range or non-numeric input raises an error (its localized text
    /// becomes the [`alert`](Self::alert)) and nothing flips.
    pub fn go_to_page(&mut self, input: &str) -> Result<(), GiftBookError> {
        let locale = self.config.locale;
        let widget = self.widget.as_mut().ok_or(GiftBookError::NoBookOpen)?;
        let total = widget.page_count();

        let result = match input.trim().parse::<i64>() {
            Err(_) => Err(GiftBookError::InvalidPageInput {
                input: input.to_string(),
            }),
            Ok(p) if p < 1 || p as u64 > total as u64 => {
                Err(GiftBookError::PageOutOfRange { page: p, total })
            }
            Ok(p) => {
                widget.flip(p as usize - 1);
                Ok(())
            }
        };
        if let Err(ref e) = result {
            self.alert = Some(e.user_message(locale));
        }
        result
    }

    // ── Zoom ─────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.zoom = Zoom::In;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = Zoom::Normal;
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    // ── Bookmarks ────────────────────────────────────────────────────────

    /// Toggle the bookmark on the 0-based page `index` of the open book.
    ///
    /// Returns whether the page is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, index: usize) -> Result<bool, GiftBookError> {
        let widget = self.widget.as_mut().ok_or(GiftBookError::NoBookOpen)?;
        let total = widget.page_count();
        if index >= total {
            return Err(GiftBookError::PageOutOfRange {
                page: index as i64 + 1,
                total,
            });
        }
        let marked = self.bookmarks.toggle(index)?;
        widget.show_bookmarks(&self.bookmarks.list()?)?;
        Ok(marked)
    }

    pub fn is_bookmarked(&self, index: usize) -> Result<bool, GiftBookError> {
        self.bookmarks.contains(index)
    }

    /// Bookmarked page indices, ascending, each listed once.
    pub fn bookmarks(&self) -> Result<Vec<usize>, GiftBookError> {
        let mut marks = self.bookmarks.list()?;
        marks.sort_unstable();
        marks.dedup();
        Ok(marks)
    }

    // ── Read-only state ──────────────────────────────────────────────────

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn widget(&self) -> Option<&dyn PageFlipWidget> {
        self.widget.as_deref()
    }

    pub fn page_count(&self) -> usize {
        self.widget.as_ref().map_or(0, |w| w.page_count())
    }

    /// 0-based index of the page on the left of the open spread.
    pub fn current_page(&self) -> Option<usize> {
        self.widget.as_ref().map(|w| w.current_page())
    }

    /// Value of the page jump input (1-based; 0 when no book is open).
    pub fn page_input(&self) -> usize {
        self.page_input.load(Ordering::SeqCst)
    }

    /// The "de N" label next to the page input.
    pub fn page_total_label(&self) -> Option<String> {
        self.widget
            .as_ref()
            .map(|w| messages::page_total(self.config.locale, w.page_count()))
    }

    /// Last text shown on the loading screen.
    pub fn loading_status(&self) -> String {
        self.loading_line
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent user-facing error message, if any.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Stats of the open book's ingestion.
    pub fn stats(&self) -> Option<&IngestStats> {
        self.stats.as_ref()
    }
}
