//! The page-flip presentation capability.
//!
//! A [`PageFlipWidget`] takes ownership of the rendered pages plus a
//! [`FlipBookConfig`] and handles navigation. Two implementations ship with
//! the crate:
//!
//! - [`MemoryFlipBook`] keeps the pages in memory and tracks the open spread;
//! - [`ExportFlipBook`] additionally writes the pages and the widget settings
//!   to a directory, for a hosting web page to display.

mod export;
mod memory;

pub use export::{ExportFlipBook, ExportManifest, ExportedPage, MANIFEST_FILE};
pub use memory::MemoryFlipBook;

use crate::error::GiftBookError;
use crate::output::RenderedPage;
use serde::{Deserialize, Serialize};

/// Listener for flip events; receives the new current page index (0-based).
pub type FlipListener = Box<dyn FnMut(usize) + Send>;

/// An interactive page-flip display.
pub trait PageFlipWidget: Send {
    /// Take ownership of the pages and apply the settings.
    fn load(&mut self, pages: Vec<RenderedPage>, config: &FlipBookConfig)
        -> Result<(), GiftBookError>;

    /// Total pages loaded.
    fn page_count(&self) -> usize;

    /// Index of the page currently shown on the left (or alone).
    fn current_page(&self) -> usize;

    /// Open the spread containing `index`.
    fn flip(&mut self, index: usize);

    /// Turn forward one spread.
    fn flip_next(&mut self);

    /// Turn back one spread.
    fn flip_prev(&mut self);

    /// Register a listener for flip events.
    fn on_flip(&mut self, listener: FlipListener);

    /// Release the pages and listeners.
    fn destroy(&mut self);

    /// Reflect the bookmarked page indices on the pages.
    fn show_bookmarks(&mut self, marks: &[usize]) -> Result<(), GiftBookError> {
        let _ = marks;
        Ok(())
    }
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl std::str::FromStr for Viewport {
    type Err = String;

    /// Parse `"1280x800"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("viewport '{s}' must look like 1280x800"))?;
        let width: f32 = w.trim().parse().map_err(|_| format!("bad viewport width '{w}'"))?;
        let height: f32 = h.trim().parse().map_err(|_| format!("bad viewport height '{h}'"))?;
        if width <= 0.0 || height <= 0.0 {
            return Err(format!("viewport '{s}' must be positive"));
        }
        Ok(Self { width, height })
    }
}

/// How the widget sizes pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Fixed to `width × height`.
    Fixed,
    /// Stretch within the min/max bounds.
    #[default]
    Stretch,
}

/// Widget settings, serialised with the widget's own key names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipBookConfig {
    pub width: u32,
    pub height: u32,
    pub size: SizeMode,
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub show_cover: bool,
    pub max_shadow_opacity: f32,
    pub use_mouse_events: bool,
}

/// Smallest single-page size the widget may shrink to.
pub const MIN_PAGE_SIDE: f32 = 200.0;

impl FlipBookConfig {
    /// Settings for a book whose first page is `first_page` pixels, shown in
    /// `viewport`.
    ///
    /// The book starts as a small overview: a page is at most 60 % of the
    /// viewport height, and an open two-page spread at most 70 % of its
    /// width. Mouse-driven corner dragging is off; navigation goes through
    /// the controls.
    pub fn responsive(first_page: (u32, u32), viewport: Viewport) -> Self {
        Self {
            width: first_page.0,
            height: first_page.1,
            size: SizeMode::Stretch,
            min_width: MIN_PAGE_SIDE,
            max_width: viewport.width * 0.7 / 2.0,
            min_height: MIN_PAGE_SIDE,
            max_height: viewport.height * 0.6,
            show_cover: true,
            max_shadow_opacity: 0.5,
            use_mouse_events: false,
        }
    }
}

/// First page index of the spread containing `index`.
///
/// With a cover, page 0 stands alone and the rest pair up as (1,2), (3,4)…;
/// without one, pages pair as (0,1), (2,3)….
pub fn spread_start(index: usize, show_cover: bool) -> usize {
    if show_cover {
        if index == 0 {
            0
        } else {
            index - (index + 1) % 2
        }
    } else {
        index - index % 2
    }
}
