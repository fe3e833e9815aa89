//! # pdfium-locate
//!
//! Find an installed [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library and bind `pdfium-render` to it.
//!
//! ## Lookup order
//!
//! 1. An explicit path handed to [`bind_pdfium`].
//! 2. `PDFIUM_LIB_PATH`: the library file, or a directory holding it.
//! 3. The per-user cache directory (see [`pdfium_cache_dir`]), where a
//!    previously installed copy is expected under its platform file name.
//! 4. The operating system's library search path.
//!
//! The first file-system hit is remembered for the rest of the process.
//!
//! ```rust,no_run
//! let pdfium = pdfium_locate::bind_pdfium(None).expect("PDFium unavailable");
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    /// The current OS/architecture combination has no known library name.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// A library file was found but `pdfium-render` could not load it.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// Nothing on disk, and the system loader could not find it either.
    #[error("PDFium library not found (searched: {searched}): {reason}")]
    NotFound { searched: String, reason: String },
}

// ── Platform library names ───────────────────────────────────────────────────

/// File name of the PDFium shared library on the current platform.
pub fn platform_library_name() -> Result<&'static str, PdfiumLocateError> {
    match std::env::consts::OS {
        "macos" | "ios" => Ok("libpdfium.dylib"),
        "linux" | "android" | "freebsd" | "openbsd" | "netbsd" => Ok("libpdfium.so"),
        "windows" => Ok("pdfium.dll"),
        os => Err(PdfiumLocateError::UnsupportedPlatform {
            os: os.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }),
    }
}

/// Directory where a user-installed PDFium copy is looked up.
///
/// - **macOS**: `~/Library/Caches/giftbook/pdfium/`
/// - **Linux**: `~/.cache/giftbook/pdfium/`
/// - **Windows**: `%LOCALAPPDATA%\giftbook\pdfium\`
///
/// Override with `PDFIUM_LOCATE_CACHE_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PDFIUM_LOCATE_CACHE_DIR") {
        return PathBuf::from(dir).join("pdfium");
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("giftbook").join("pdfium")
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Candidate library files in lookup order, excluding the system search path.
///
/// Directories are expanded to the platform library name inside them.
pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let name = platform_library_name().ok();
    let expand = |p: PathBuf| match name {
        Some(name) if p.is_dir() => p.join(name),
        _ => p,
    };

    let mut out = Vec::with_capacity(3);
    if let Some(p) = explicit {
        out.push(expand(p.to_path_buf()));
    }
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        if !p.is_empty() {
            out.push(expand(PathBuf::from(p)));
        }
    }
    if let Some(name) = name {
        out.push(pdfium_cache_dir().join(name));
    }
    out
}

/// Returns the first candidate library file that exists on disk.
pub fn find_pdfium_library(explicit: Option<&Path>) -> Option<PathBuf> {
    if explicit.is_none() {
        if let Some(p) = RESOLVED_PATH.get() {
            return Some(p.clone());
        }
    }

    let found = candidate_paths(explicit).into_iter().find(|p| p.is_file())?;
    if explicit.is_none() {
        let _ = RESOLVED_PATH.set(found.clone());
    }
    Some(found)
}

/// Binds to PDFium, falling back to the system library search path.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, PdfiumLocateError> {
    if let Some(path) = find_pdfium_library(explicit) {
        return bind_pdfium_from_path(&path);
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::NotFound {
            searched: candidate_paths(explicit)
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            reason: e.to_string(),
        })
}

/// Binds to a PDFium library at an explicit `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumLocateError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_name_is_known() {
        let name = platform_library_name().expect("current platform should be supported");
        assert!(name.contains("pdfium"));
    }

    #[test]
    fn cache_dir_is_deterministic() {
        let d1 = pdfium_cache_dir();
        let d2 = pdfium_cache_dir();
        assert_eq!(d1, d2);
        assert!(d1.ends_with("pdfium"));
    }

    #[test]
    fn explicit_path_comes_first() {
        let p = Path::new("/opt/pdfium/libpdfium.so");
        let candidates = candidate_paths(Some(p));
        assert_eq!(candidates[0], p);
    }

    #[test]
    fn directories_expand_to_the_library_name() {
        let dir = std::env::temp_dir();
        let candidates = candidate_paths(Some(&dir));
        assert_eq!(candidates[0], dir.join(platform_library_name().unwrap()));
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let p = Path::new("/definitely/not/here/libpdfium.so");
        let found = find_pdfium_library(Some(p));
        assert_ne!(found.as_deref(), Some(p));
    }
}
