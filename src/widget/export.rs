//! Directory-backed page-flip widget.
//!
//! Loading writes one PNG per page plus a `flipbook.json` manifest carrying
//! the widget settings, so a static web page can drive a real page-flip
//! library from them. Navigation is delegated to [`MemoryFlipBook`].

use super::memory::check_load;
use super::{FlipBookConfig, FlipListener, MemoryFlipBook, PageFlipWidget};
use crate::error::GiftBookError;
use crate::output::RenderedPage;
use crate::pipeline::encode::{encode_data_uri, encode_png};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "flipbook.json";

/// One page entry in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedPage {
    pub index: usize,
    pub page_number: usize,
    pub source_index: usize,
    pub width: u32,
    pub height: u32,
    /// PNG file name relative to the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Inline `data:image/png;base64,…` image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_uri: Option<String>,
}

/// Contents of `flipbook.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    pub settings: FlipBookConfig,
    pub page_count: usize,
    pub pages: Vec<ExportedPage>,
    /// Bookmarked page indices (0-based), ascending.
    #[serde(default)]
    pub bookmarks: Vec<usize>,
}

impl ExportManifest {
    /// Read a manifest previously written by [`ExportFlipBook`].
    pub fn read(dir: impl AsRef<Path>) -> Result<Self, GiftBookError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| GiftBookError::SourceRead { path: path.clone(), source: e })?;
        serde_json::from_str(&text)
            .map_err(|e| GiftBookError::Widget(format!("{}: {e}", path.display())))
    }
}

fn page_file_name(index: usize) -> String {
    format!("page-{:04}.png", index + 1)
}

fn is_page_file(name: &str) -> bool {
    name.strip_prefix("page-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Page-flip widget that publishes the book to a directory.
pub struct ExportFlipBook {
    dir: PathBuf,
    inline_images: bool,
    inner: MemoryFlipBook,
    manifest: Option<ExportManifest>,
    bookmarks: Vec<usize>,
}

impl ExportFlipBook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            inline_images: false,
            inner: MemoryFlipBook::new(),
            manifest: None,
            bookmarks: Vec::new(),
        }
    }

    /// Embed pages in the manifest as data URIs instead of separate files.
    pub fn inline_images(mut self, inline: bool) -> Self {
        self.inline_images = inline;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The manifest as last written.
    pub fn manifest(&self) -> Option<&ExportManifest> {
        self.manifest.as_ref()
    }

    /// Record the bookmarked pages; rewrites the manifest if a book is loaded.
    pub fn set_bookmarks(&mut self, mut pages: Vec<usize>) -> Result<(), GiftBookError> {
        pages.sort_unstable();
        pages.dedup();
        self.bookmarks = pages;
        if let Some(mut manifest) = self.manifest.take() {
            manifest.bookmarks = self.bookmarks.clone();
            let written = self.write_manifest(&manifest);
            self.manifest = Some(manifest);
            written?;
        }
        Ok(())
    }

    fn write_err(path: &Path, e: std::io::Error) -> GiftBookError {
        GiftBookError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    }

    /// Write `bytes` to `name` in the output directory via a temp file + rename.
    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), GiftBookError> {
        let path = self.dir.join(name);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| Self::write_err(&path, e))?;
        tmp.write_all(bytes).map_err(|e| Self::write_err(&path, e))?;
        tmp.persist(&path).map_err(|e| Self::write_err(&path, e.error))?;
        Ok(())
    }

    fn write_manifest(&self, manifest: &ExportManifest) -> Result<(), GiftBookError> {
        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| GiftBookError::Internal(format!("manifest serialisation: {e}")))?;
        self.write_atomic(MANIFEST_FILE, &json)?;
        debug!("Wrote {}", self.dir.join(MANIFEST_FILE).display());
        Ok(())
    }

    /// Delete `page-NNNN.png` files a previous, longer export left behind.
    fn remove_stale_pages(&self, keep: &[ExportedPage]) -> Result<(), GiftBookError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| Self::write_err(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Self::write_err(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_page_file(name) || keep.iter().any(|p| p.file.as_deref() == Some(name)) {
                continue;
            }
            let path = entry.path();
            std::fs::remove_file(&path).map_err(|e| Self::write_err(&path, e))?;
            debug!("Removed stale {}", path.display());
        }
        Ok(())
    }

    fn export_page(&self, page: &RenderedPage) -> Result<ExportedPage, GiftBookError> {
        let (width, height) = page.dimensions();
        let mut entry = ExportedPage {
            index: page.index,
            page_number: page.page_number,
            source_index: page.source_index,
            width,
            height,
            file: None,
            data_uri: None,
        };

        let name = page_file_name(page.index);
        let encode_err = |e: image::ImageError| {
            Self::write_err(&self.dir.join(&name), std::io::Error::other(e))
        };
        if self.inline_images {
            entry.data_uri = Some(encode_data_uri(&page.image).map_err(encode_err)?);
        } else {
            let png = encode_png(&page.image).map_err(encode_err)?;
            self.write_atomic(&name, &png)?;
            entry.file = Some(name);
        }
        Ok(entry)
    }
}

impl PageFlipWidget for ExportFlipBook {
    fn load(
        &mut self,
        pages: Vec<RenderedPage>,
        config: &FlipBookConfig,
    ) -> Result<(), GiftBookError> {
        check_load(&pages, config)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::write_err(&self.dir, e))?;

        let exported = pages
            .iter()
            .map(|p| self.export_page(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.remove_stale_pages(&exported)?;

        let manifest = ExportManifest {
            settings: config.clone(),
            page_count: exported.len(),
            pages: exported,
            bookmarks: self.bookmarks.clone(),
        };

        self.inner.load(pages, config)?;
        self.write_manifest(&manifest)?;
        info!(
            "Exported {} pages to {}",
            manifest.page_count,
            self.dir.display()
        );
        self.manifest = Some(manifest);
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn current_page(&self) -> usize {
        self.inner.current_page()
    }

    fn flip(&mut self, index: usize) {
        self.inner.flip(index);
    }

    fn flip_next(&mut self) {
        self.inner.flip_next();
    }

    fn flip_prev(&mut self) {
        self.inner.flip_prev();
    }

    fn on_flip(&mut self, listener: FlipListener) {
        self.inner.on_flip(listener);
    }

    fn destroy(&mut self) {
        self.inner.destroy();
        self.manifest = None;
    }

    fn show_bookmarks(&mut self, marks: &[usize]) -> Result<(), GiftBookError> {
        self.set_bookmarks(marks.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Viewport;
    use image::{Rgba, RgbaImage};

    fn pages(n: usize) -> Vec<RenderedPage> {
        (0..n)
            .map(|i| RenderedPage {
                index: i,
                source_index: i / 2,
                page_in_source: i % 2 + 1,
                page_number: i % 2 + 1,
                image: RgbaImage::from_pixel(8, 12, Rgba([255, 255, 255, 255])),
            })
            .collect()
    }

    fn config() -> FlipBookConfig {
        FlipBookConfig::responsive((8, 12), Viewport::default())
    }

    #[test]
    fn writes_pngs_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = ExportFlipBook::new(dir.path());
        book.load(pages(3), &config()).unwrap();

        assert!(dir.path().join("page-0001.png").exists());
        assert!(dir.path().join("page-0003.png").exists());

        let manifest = ExportManifest::read(dir.path()).unwrap();
        assert_eq!(manifest.page_count, 3);
        assert_eq!(manifest.pages[2].file.as_deref(), Some("page-0003.png"));
        assert_eq!(manifest.pages[2].page_number, 1);
        assert_eq!(manifest.settings, config());
        assert_eq!(book.page_count(), 3);
    }

    #[test]
    fn inline_images_skip_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = ExportFlipBook::new(dir.path()).inline_images(true);
        book.load(pages(1), &config()).unwrap();

        assert!(!dir.path().join("page-0001.png").exists());
        let m = book.manifest().unwrap();
        assert!(m.pages[0]
            .data_uri
            .as_deref()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[test]
    fn manifest_uses_widget_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = ExportFlipBook::new(dir.path());
        book.load(pages(1), &config()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["settings"]["showCover"], true);
        assert_eq!(v["pageCount"], 1);
        assert_eq!(v["pages"][0]["pageNumber"], 1);
    }

    #[test]
    fn bookmarks_rewrite_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = ExportFlipBook::new(dir.path());
        book.load(pages(4), &config()).unwrap();
        book.set_bookmarks(vec![3, 1, 3]).unwrap();

        let manifest = ExportManifest::read(dir.path()).unwrap();
        assert_eq!(manifest.bookmarks, vec![1, 3]);
    }

    #[test]
    fn shorter_reexport_removes_old_pages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.png"), b"keep").unwrap();

        ExportFlipBook::new(dir.path())
            .load(pages(5), &config())
            .unwrap();
        let mut book = ExportFlipBook::new(dir.path());
        book.load(pages(2), &config()).unwrap();

        let mut on_disk: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|n| n.ends_with(".png"))
            .collect();
        on_disk.sort();
        assert_eq!(on_disk, vec!["cover.png", "page-0001.png", "page-0002.png"]);
        assert_eq!(ExportManifest::read(dir.path()).unwrap().page_count, 2);
    }

    #[test]
    fn inline_reexport_clears_page_files() {
        let dir = tempfile::tempdir().unwrap();
        ExportFlipBook::new(dir.path())
            .load(pages(2), &config())
            .unwrap();
        ExportFlipBook::new(dir.path())
            .inline_images(true)
            .load(pages(2), &config())
            .unwrap();
        assert!(!dir.path().join("page-0001.png").exists());
        assert!(!dir.path().join("page-0002.png").exists());
    }

    #[test]
    fn invalid_settings_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book");
        let mut bad = config();
        bad.width = 0;

        let err = ExportFlipBook::new(&out).load(pages(3), &bad).unwrap_err();
        assert!(matches!(err, GiftBookError::Widget(_)));
        assert!(!out.exists());
    }

    #[test]
    fn page_file_names_are_recognised() {
        assert!(is_page_file("page-0001.png"));
        assert!(is_page_file("page-12345.png"));
        assert!(!is_page_file("page-.png"));
        assert!(!is_page_file("page-01a.png"));
        assert!(!is_page_file("cover.png"));
    }

    #[test]
    fn navigation_is_delegated() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = ExportFlipBook::new(dir.path());
        book.load(pages(4), &config()).unwrap();
        book.flip_next();
        book.flip_next();
        assert_eq!(book.current_page(), 3);
        book.destroy();
        assert!(book.manifest().is_none());
    }
}
