//! Result types produced by ingestion.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// One rendered page of the final book.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based position in the combined book.
    pub index: usize,
    /// 0-based position of the source this page came from.
    pub source_index: usize,
    /// 1-based page number within its source.
    pub page_in_source: usize,
    /// The numeral stamped on the page (also set when stamping is disabled).
    pub page_number: usize,
    /// Pixels, with the page number already drawn in.
    pub image: RgbaImage,
}

impl RenderedPage {
    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Timing and size summary for one ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Sources rendered.
    pub sources: usize,
    /// Pages in the final book.
    pub pages: usize,
    /// Page count contributed by each source, in book order.
    pub pages_per_source: Vec<usize>,
    /// Wall-clock time for the whole ingestion.
    pub total_duration_ms: u64,
}

/// The assembled, ordered book.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub pages: Vec<RenderedPage>,
    pub stats: IngestStats,
}

impl Book {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pixel size of the first page, which drives the widget settings.
    pub fn first_page_dimensions(&self) -> Option<(u32, u32)> {
        self.pages.first().map(RenderedPage::dimensions)
    }

    /// Stamped numerals in book order.
    pub fn page_numbers(&self) -> Vec<usize> {
        self.pages.iter().map(|p| p.page_number).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, w: u32, h: u32) -> RenderedPage {
        RenderedPage {
            index,
            source_index: 0,
            page_in_source: index + 1,
            page_number: index + 1,
            image: RgbaImage::new(w, h),
        }
    }

    #[test]
    fn first_page_dimensions_drive_sizing() {
        let book = Book {
            pages: vec![page(0, 40, 60), page(1, 80, 20)],
            stats: IngestStats::default(),
        };
        assert_eq!(book.first_page_dimensions(), Some((40, 60)));
        assert_eq!(book.page_numbers(), vec![1, 2]);
    }

    #[test]
    fn empty_book_has_no_dimensions() {
        assert_eq!(Book::default().first_page_dimensions(), None);
        assert!(Book::default().is_empty());
    }
}
