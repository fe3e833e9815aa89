//! Reader-facing text: progress lines and error messages.
//!
//! Spanish is the default locale; English is available for tooling and logs.

use serde::{Deserialize, Serialize};

/// Language of reader-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Spanish (default).
    #[default]
    Es,
    /// English.
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Locale::Es),
            "en" | "english" => Ok(Locale::En),
            other => Err(format!("unsupported locale '{other}' (expected es or en)")),
        }
    }
}

/// Shown when a selection contains no PDF.
pub fn no_pdf_selected(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "Por favor selecciona archivos PDF válidos.",
        Locale::En => "Please select valid PDF files.",
    }
}

/// Shown when ingestion aborts.
pub fn processing_failed(locale: Locale, detail: &str) -> String {
    match locale {
        Locale::Es => format!("Error al procesar los PDFs: {detail}"),
        Locale::En => format!("Error processing the PDFs: {detail}"),
    }
}

/// Shown when a page jump falls outside the book.
pub fn page_out_of_range(locale: Locale, page: i64, total: usize) -> String {
    match locale {
        Locale::Es => format!("Página {page} fuera de rango. El libro tiene {total} páginas."),
        Locale::En => format!("Page {page} is out of range. The book has {total} pages."),
    }
}

/// Shown when the page jump input is not a number.
pub fn invalid_page_input(locale: Locale, input: &str) -> String {
    match locale {
        Locale::Es => format!("'{input}' no es un número de página válido."),
        Locale::En => format!("'{input}' is not a valid page number."),
    }
}

/// Loading line shown when a source starts.
pub fn source_started(locale: Locale, source_num: usize, total_sources: usize, name: &str) -> String {
    match locale {
        Locale::Es => format!("Procesando archivo {source_num} de {total_sources}: {name}..."),
        Locale::En => format!("Processing file {source_num} of {total_sources}: {name}..."),
    }
}

/// Loading line shown before each page renders.
pub fn page_rendering(
    locale: Locale,
    source_num: usize,
    total_sources: usize,
    name: &str,
    page: usize,
    total_pages: usize,
) -> String {
    match locale {
        Locale::Es => format!(
            "Archivo {source_num}/{total_sources} ({name}): Renderizando página {page}/{total_pages}..."
        ),
        Locale::En => format!(
            "File {source_num}/{total_sources} ({name}): Rendering page {page}/{total_pages}..."
        ),
    }
}

/// Loading line shown when an embedded book part starts.
pub fn embedded_started(locale: Locale, part: usize, total_parts: usize) -> String {
    match locale {
        Locale::Es => format!("Procesando archivo incrustado {part} de {total_parts}..."),
        Locale::En => format!("Processing embedded file {part} of {total_parts}..."),
    }
}

/// Loading line for an embedded book part; parts have no meaningful name.
pub fn embedded_page_rendering(
    locale: Locale,
    part: usize,
    total_parts: usize,
    page: usize,
    total_pages: usize,
) -> String {
    match locale {
        Locale::Es => {
            format!("Archivo {part}/{total_parts}: Renderizando página {page}/{total_pages}...")
        }
        Locale::En => format!("File {part}/{total_parts}: Rendering page {page}/{total_pages}..."),
    }
}

/// Alert shown when the embedded book cannot be loaded.
pub fn embedded_failed(locale: Locale, detail: &str) -> String {
    match locale {
        Locale::Es => format!("Error cargando el libro regalo: {detail}"),
        Locale::En => format!("Error loading the gift book: {detail}"),
    }
}

/// Page-count label next to the page jump input.
pub fn page_total(locale: Locale, total: usize) -> String {
    match locale {
        Locale::Es => format!("de {total}"),
        Locale::En => format!("of {total}"),
    }
}
