//! Error types for the giftbook library.
//!
//! Every failure that can stop a book from being built is a
//! [`GiftBookError`]. There is no page-level, non-fatal variant: one bad
//! source or one bad page aborts the whole ingestion and the caller goes back
//! to the selection state.
//!
//! [`ErrorKind`] groups the variants into the coarse classes a UI cares about
//! (decode, render, source read, …) and [`GiftBookError::user_message`]
//! renders the single localized message shown to the reader.

use crate::messages::{self, Locale};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the giftbook library.
#[derive(Debug, Error)]
pub enum GiftBookError {
    // ── Decode errors ─────────────────────────────────────────────────────
    /// The selection contained no source declared as `application/pdf`.
    #[error("No PDF files selected ({total} file(s) given, none of type application/pdf)")]
    NoPdfSelected { total: usize },

    /// The bytes do not start with the `%PDF` signature.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// pdfium refused to open the document.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// The document requires a password that was missing or wrong.
    #[error("PDF '{name}' is encrypted and the password is missing or wrong")]
    PasswordRequired { name: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// pdfium failed while rasterising a page.
    #[error("Rasterisation failed for '{name}' page {page}: {detail}")]
    RenderFailed {
        name: String,
        page: usize,
        detail: String,
    },

    // ── Source read errors ────────────────────────────────────────────────
    /// The underlying file could not be read.
    #[error("Failed to read '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An embedded data URI was malformed or not valid base64.
    #[error("Embedded book part {index} is not a valid data URI: {detail}")]
    InvalidDataUri { index: usize, detail: String },

    // ── Navigation errors ─────────────────────────────────────────────────
    /// Page jump outside `[1, total]`.
    #[error("Page {page} is out of range (book has {total} pages)")]
    PageOutOfRange { page: i64, total: usize },

    /// Page jump input was not a number.
    #[error("'{input}' is not a page number")]
    InvalidPageInput { input: String },

    /// An operation needing an open book was called on the selection screen.
    #[error("No book is open")]
    NoBookOpen,

    // ── Presentation errors ───────────────────────────────────────────────
    /// The page-flip widget rejected the pages or settings.
    #[error("Page-flip widget error: {0}")]
    Widget(String),

    // ── Storage / output errors ───────────────────────────────────────────
    /// Bookmark storage could not be read or written.
    #[error("Bookmark storage error for key '{key}': {detail}")]
    Storage { key: String, detail: String },

    /// Could not write an exported page or manifest.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium and either:\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium, or\n\
  • copy it into the giftbook cache directory, or\n\
  • place it on the system library search path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`GiftBookError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bytes are not a usable PDF, or no PDF was selected at all.
    Decode,
    /// A page failed to rasterise.
    Render,
    /// The source bytes could not be obtained.
    SourceRead,
    /// Page navigation input was rejected.
    Navigation,
    /// Everything else: config, storage, output, binding, widget.
    Other,
}

impl GiftBookError {
    /// The class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GiftBookError::NoPdfSelected { .. }
            | GiftBookError::NotAPdf { .. }
            | GiftBookError::CorruptPdf { .. }
            | GiftBookError::PasswordRequired { .. } => ErrorKind::Decode,
            GiftBookError::RenderFailed { .. } => ErrorKind::Render,
            GiftBookError::SourceRead { .. } | GiftBookError::InvalidDataUri { .. } => {
                ErrorKind::SourceRead
            }
            GiftBookError::PageOutOfRange { .. }
            | GiftBookError::InvalidPageInput { .. }
            | GiftBookError::NoBookOpen => ErrorKind::Navigation,
            _ => ErrorKind::Other,
        }
    }

    /// The single message shown to the reader for this error.
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            GiftBookError::NoPdfSelected { .. } => messages::no_pdf_selected(locale).to_string(),
            GiftBookError::PageOutOfRange { page, total } => {
                messages::page_out_of_range(locale, *page, *total)
            }
            GiftBookError::InvalidPageInput { input } => {
                messages::invalid_page_input(locale, input)
            }
            other => messages::processing_failed(locale, &other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pdf_selected_is_decode_class() {
        let e = GiftBookError::NoPdfSelected { total: 2 };
        assert_eq!(e.kind(), ErrorKind::Decode);
        assert!(e.to_string().contains("2 file(s)"));
    }

    #[test]
    fn render_failed_display() {
        let e = GiftBookError::RenderFailed {
            name: "b.pdf".into(),
            page: 4,
            detail: "bitmap alloc".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("b.pdf"), "got: {msg}");
        assert!(msg.contains("page 4"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Render);
    }

    #[test]
    fn data_uri_error_is_source_read_class() {
        let e = GiftBookError::InvalidDataUri {
            index: 2,
            detail: "bad base64".into(),
        };
        assert_eq!(e.kind(), ErrorKind::SourceRead);
    }

    #[test]
    fn out_of_range_user_message_es() {
        let e = GiftBookError::PageOutOfRange { page: 12, total: 10 };
        assert_eq!(
            e.user_message(Locale::Es),
            "Página 12 fuera de rango. El libro tiene 10 páginas."
        );
    }

    #[test]
    fn processing_failure_user_message_en() {
        let e = GiftBookError::CorruptPdf {
            name: "x.pdf".into(),
            detail: "bad xref".into(),
        };
        let msg = e.user_message(Locale::En);
        assert!(msg.starts_with("Error processing the PDFs: "), "got: {msg}");
        assert!(msg.contains("x.pdf"));
    }
}
