//! In-memory page-flip widget.

use super::{spread_start, FlipBookConfig, FlipListener, PageFlipWidget};
use crate::error::GiftBookError;
use crate::output::RenderedPage;
use tracing::debug;

/// Holds the book's pages and tracks which spread is open.
///
/// Flips land on the first page of a spread (see [`spread_start`]); every
/// change of the current page notifies the registered listeners.
#[derive(Default)]
pub struct MemoryFlipBook {
    pages: Vec<RenderedPage>,
    config: Option<FlipBookConfig>,
    current: usize,
    listeners: Vec<FlipListener>,
}

impl MemoryFlipBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages currently loaded.
    pub fn pages(&self) -> &[RenderedPage] {
        &self.pages
    }

    /// Settings passed to the last [`PageFlipWidget::load`].
    pub fn config(&self) -> Option<&FlipBookConfig> {
        self.config.as_ref()
    }

    fn show_cover(&self) -> bool {
        self.config.as_ref().map(|c| c.show_cover).unwrap_or(true)
    }

    fn set_current(&mut self, index: usize) {
        if index == self.current {
            return;
        }
        debug!("Flip {} → {}", self.current, index);
        self.current = index;
        for listener in &mut self.listeners {
            listener(index);
        }
    }
}

/// Reject what no page-flip widget can show: an empty book or a zero page size.
pub(crate) fn check_load(
    pages: &[RenderedPage],
    config: &FlipBookConfig,
) -> Result<(), GiftBookError> {
    if pages.is_empty() {
        return Err(GiftBookError::Widget("cannot load a book with no pages".into()));
    }
    if config.width == 0 || config.height == 0 {
        return Err(GiftBookError::Widget(format!(
            "invalid page size {}x{}",
            config.width, config.height
        )));
    }
    Ok(())
}

impl PageFlipWidget for MemoryFlipBook {
    fn load(
        &mut self,
        pages: Vec<RenderedPage>,
        config: &FlipBookConfig,
    ) -> Result<(), GiftBookError> {
        check_load(&pages, config)?;
        self.pages = pages;
        self.config = Some(config.clone());
        self.current = 0;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page(&self) -> usize {
        self.current
    }

    fn flip(&mut self, index: usize) {
        if self.pages.is_empty() {
            return;
        }
        let index = index.min(self.pages.len() - 1);
        let target = spread_start(index, self.show_cover());
        self.set_current(target);
    }

    fn flip_next(&mut self) {
        if self.pages.is_empty() {
            return;
        }
        let start = spread_start(self.current, self.show_cover());
        let step = if self.show_cover() && start == 0 { 1 } else { 2 };
        let next = start + step;
        if next < self.pages.len() {
            self.set_current(next);
        }
    }

    fn flip_prev(&mut self) {
        let start = spread_start(self.current, self.show_cover());
        if start == 0 {
            return;
        }
        let prev = spread_start(start - 1, self.show_cover());
        self.set_current(prev);
    }

    fn on_flip(&mut self, listener: FlipListener) {
        self.listeners.push(listener);
    }

    fn destroy(&mut self) {
        self.pages.clear();
        self.listeners.clear();
        self.config = None;
        self.current = 0;
    }
}
