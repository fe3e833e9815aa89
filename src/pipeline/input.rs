//! Input resolution: turn files, byte buffers and embedded data URIs into
//! [`DocumentSource`]s, in a predictable book order.
//!
//! Uploaded selections arrive in whatever order the file picker produced, so
//! they are sorted by display name with a natural, case- and accent-blind
//! comparison (`"2.pdf"` before `"10.pdf"`) and then filtered down to sources
//! declared as `application/pdf`. Embedded book parts come from the hosting
//! page, are already ordered, and are trusted as PDFs.

use crate::error::GiftBookError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// MIME type of a PDF document.
pub const PDF_MIME: &str = "application/pdf";

/// Where a source's bytes live.
#[derive(Debug, Clone)]
pub enum SourceData {
    /// Already in memory.
    Bytes(Vec<u8>),
    /// Read from disk when ingestion reaches this source.
    File(PathBuf),
}

/// One PDF file waiting to be rendered.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    /// Display name, used for ordering and progress lines.
    pub name: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    pub data: SourceData,
}

impl DocumentSource {
    /// A source backed by an in-memory buffer.
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(str::to_string),
            data: SourceData::Bytes(bytes.into()),
        }
    }

    /// A source backed by a file, typed by extension the way a file picker
    /// would type it. Nothing is read until ingestion.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            content_type: guess_content_type(path).map(str::to_string),
            data: SourceData::File(path.to_path_buf()),
        }
    }

    /// Decode an embedded `data:application/pdf;base64,…` URI.
    ///
    /// `index` is 0-based; the resulting name is `book_part_{index + 1}.pdf`.
    pub fn from_data_uri(uri: &str, index: usize) -> Result<Self, GiftBookError> {
        let bytes = decode_data_uri(uri, index + 1)?;
        Ok(Self::from_bytes(
            format!("book_part_{}.pdf", index + 1),
            Some(PDF_MIME),
            bytes,
        ))
    }

    /// `true` when the declared type is `application/pdf`.
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|t| t.trim().eq_ignore_ascii_case(PDF_MIME))
            .unwrap_or(false)
    }

    /// Consume the source and return its bytes.
    pub async fn read_bytes(self) -> Result<Vec<u8>, GiftBookError> {
        match self.data {
            SourceData::Bytes(b) => Ok(b),
            SourceData::File(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| GiftBookError::SourceRead {
                        path: path.clone(),
                        source,
                    })?;
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
        }
    }
}

/// MIME type implied by a file extension.
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF_MIME),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "txt" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "json" => Some("application/json"),
        "epub" => Some("application/epub+zip"),
        _ => None,
    }
}

/// Reject bytes that lack the `%PDF` signature before handing them to pdfium.
pub fn check_pdf_magic(name: &str, bytes: &[u8]) -> Result<(), GiftBookError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(GiftBookError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

// ── Ordering ─────────────────────────────────────────────────────────────

/// Compare two display names the way a reader orders numbered files.
///
/// Digit runs compare by numeric value, letters compare without regard to
/// case or accents, and punctuation sorts before digits, which sort before
/// letters. Names that only differ by case or accents fall back to plain
/// code-point order so the result is total and deterministic.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let fa = fold(a);
    let fb = fold(b);
    compare_folded(&fa, &fb).then_with(|| a.cmp(b))
}

fn fold(s: &str) -> Vec<char> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn char_class(c: char) -> u8 {
    if c.is_ascii_digit() {
        1
    } else if c.is_alphabetic() {
        2
    } else {
        0
    }
}

fn compare_folded(a: &[char], b: &[char]) -> Ordering {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (ra, ni) = digit_run(a, i);
            let (rb, nj) = digit_run(b, j);
            let ord = compare_numeric(ra, rb);
            if ord != Ordering::Equal {
                return ord;
            }
            i = ni;
            j = nj;
            continue;
        }

        let ord = char_class(a[i])
            .cmp(&char_class(b[j]))
            .then(a[i].cmp(&b[j]));
        if ord != Ordering::Equal {
            return ord;
        }
        i += 1;
        j += 1;
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run(s: &[char], start: usize) -> (&[char], usize) {
    let end = s[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(s.len(), |n| start + n);
    (&s[start..end], end)
}

fn compare_numeric(a: &[char], b: &[char]) -> Ordering {
    let strip = |s: &[char]| -> usize { s.iter().take_while(|c| **c == '0').count() };
    let a = &a[strip(a)..];
    let b = &b[strip(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort sources in place by [`natural_cmp`] on their display names.
pub fn sort_natural(sources: &mut [DocumentSource]) {
    sources.sort_by(|a, b| natural_cmp(&a.name, &b.name));
}

/// Order an uploaded selection and keep only the PDFs.
///
/// Returns [`GiftBookError::NoPdfSelected`] when nothing survives.
pub fn prepare_uploads(
    mut sources: Vec<DocumentSource>,
) -> Result<Vec<DocumentSource>, GiftBookError> {
    let total = sources.len();
    sort_natural(&mut sources);
    let pdfs: Vec<DocumentSource> = sources.into_iter().filter(|s| s.is_pdf()).collect();
    if pdfs.is_empty() {
        return Err(GiftBookError::NoPdfSelected { total });
    }
    if pdfs.len() < total {
        debug!("Dropped {} non-PDF file(s) from selection", total - pdfs.len());
    }
    Ok(pdfs)
}

// ── Embedded book data ───────────────────────────────────────────────────

static DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^data:([^,]*?)(;base64)?,(.*)$").expect("static regex"));

/// Decode a base64 data URI into raw bytes. `part` is 1-based.
fn decode_data_uri(uri: &str, part: usize) -> Result<Vec<u8>, GiftBookError> {
    let caps = DATA_URI
        .captures(uri.trim())
        .ok_or_else(|| GiftBookError::InvalidDataUri {
            index: part,
            detail: "missing 'data:' prefix or ',' separator".into(),
        })?;

    if caps.get(2).is_none() {
        return Err(GiftBookError::InvalidDataUri {
            index: part,
            detail: "payload is not base64-encoded".into(),
        });
    }

    let payload: String = caps[3].chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| GiftBookError::InvalidDataUri {
            index: part,
            detail: e.to_string(),
        })
}

/// Decode the hosting page's embedded book parts, in the given order.
pub fn embedded_sources<S: AsRef<str>>(
    uris: &[S],
) -> Result<Vec<DocumentSource>, GiftBookError> {
    uris.iter()
        .enumerate()
        .map(|(i, uri)| DocumentSource::from_data_uri(uri.as_ref(), i))
        .collect()
}

/// Load a JSON array of data URIs, as a hosting page would embed it.
pub async fn load_embedded_manifest(path: &Path) -> Result<Vec<String>, GiftBookError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GiftBookError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str::<Vec<String>>(&text).map_err(|e| GiftBookError::InvalidDataUri {
        index: 0,
        detail: format!("{}: expected a JSON array of strings: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sources: &[DocumentSource]) -> Vec<&str> {
        sources.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn natural_order_puts_2_before_10() {
        let mut v = vec!["10.pdf", "2.pdf", "1.pdf"];
        v.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(v, vec!["1.pdf", "2.pdf", "10.pdf"]);
    }

    #[test]
    fn natural_order_ignores_case_and_accents() {
        assert_eq!(natural_cmp("Capítulo 2", "capitulo 10"), Ordering::Less);
        assert_eq!(natural_cmp("b.pdf", "A.pdf"), Ordering::Greater);
    }

    #[test]
    fn natural_order_leading_zeros() {
        assert_eq!(natural_cmp("part 007", "part 8"), Ordering::Less);
        assert_eq!(natural_cmp("part 010", "part 9"), Ordering::Greater);
    }

    #[test]
    fn natural_order_is_total() {
        assert_ne!(natural_cmp("a.pdf", "A.pdf"), Ordering::Equal);
        assert_eq!(natural_cmp("a.pdf", "a.pdf"), Ordering::Equal);
    }

    #[test]
    fn prepare_uploads_sorts_and_filters() {
        let sources = vec![
            DocumentSource::from_bytes("10.pdf", Some(PDF_MIME), b"%PDF".to_vec()),
            DocumentSource::from_bytes("notes.txt", Some("text/plain"), b"hi".to_vec()),
            DocumentSource::from_bytes("2.pdf", Some(PDF_MIME), b"%PDF".to_vec()),
        ];
        let ready = prepare_uploads(sources).unwrap();
        assert_eq!(names(&ready), vec!["2.pdf", "10.pdf"]);
    }

    #[test]
    fn prepare_uploads_rejects_non_pdf_selection() {
        let sources = vec![DocumentSource::from_bytes(
            "cover.png",
            Some("image/png"),
            vec![0u8; 4],
        )];
        let err = prepare_uploads(sources).unwrap_err();
        assert!(matches!(err, GiftBookError::NoPdfSelected { total: 1 }));
    }

    #[test]
    fn from_path_types_by_extension() {
        let s = DocumentSource::from_path("/tmp/book/Part 1.PDF");
        assert_eq!(s.name, "Part 1.PDF");
        assert!(s.is_pdf());
        let s = DocumentSource::from_path("/tmp/book/readme");
        assert!(!s.is_pdf());
    }

    #[test]
    fn data_uri_decodes() {
        let uri = format!("data:application/pdf;base64,{}", STANDARD.encode(b"%PDF-1.4"));
        let s = DocumentSource::from_data_uri(&uri, 0).unwrap();
        assert_eq!(s.name, "book_part_1.pdf");
        assert!(s.is_pdf());
        match s.data {
            SourceData::Bytes(b) => assert_eq!(b, b"%PDF-1.4"),
            SourceData::File(_) => panic!("expected bytes"),
        }
    }

    #[test]
    fn data_uri_without_base64_is_rejected() {
        let err = DocumentSource::from_data_uri("data:application/pdf,%25PDF", 1).unwrap_err();
        assert!(matches!(err, GiftBookError::InvalidDataUri { index: 2, .. }));
    }

    #[test]
    fn data_uri_garbage_is_rejected() {
        assert!(DocumentSource::from_data_uri("not a uri", 0).is_err());
        assert!(DocumentSource::from_data_uri("data:application/pdf;base64,@@@", 0).is_err());
    }

    #[test]
    fn pdf_magic_check() {
        assert!(check_pdf_magic("a.pdf", b"%PDF-1.7").is_ok());
        let err = check_pdf_magic("a.pdf", b"PK\x03\x04rest").unwrap_err();
        match err {
            GiftBookError::NotAPdf { magic, .. } => assert_eq!(magic, b"PK\x03\x04"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_source_read_error() {
        let s = DocumentSource::from_path("/definitely/not/here.pdf");
        let err = s.read_bytes().await.unwrap_err();
        assert!(matches!(err, GiftBookError::SourceRead { .. }));
    }
}
