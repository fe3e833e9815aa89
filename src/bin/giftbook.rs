//! CLI binary for giftbook.
//!
//! A thin shim over the library crate: maps CLI flags to `GiftBookConfig`,
//! opens the book in a `ViewerSession` and reports what it built.

use anyhow::{Context, Result};
use clap::Parser;
use giftbook::pipeline::input::load_embedded_manifest;
use giftbook::{
    inspect_embedded, inspect_uploads, DocumentDecoder, DocumentSource, ExportFlipBook, FileStore,
    GiftBookConfig, IngestProgressCallback, KeyValueStore, Locale, MemoryFlipBook, MemoryStore, PageFlipWidget,
    PageNumbering, PdfiumDecoder, ProgressCallback, ViewerSession, Viewport, WidgetFactory,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner until the first source opens, then one bar
/// per source that fills as its pages render.
struct CliProgressCallback {
    bar: ProgressBar,
    source_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Sorting files…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            source_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, source_num: usize, total_sources: usize, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(style);
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(format!("File {source_num}/{total_sources}"));
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, total_sources: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Building a book from {total_sources} file(s)…"))
        ));
    }

    fn on_source_start(&self, _source_num: usize, _total_sources: usize, name: &str) {
        *self.source_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(name.to_string());
    }

    fn on_page_start(
        &self,
        source_num: usize,
        total_sources: usize,
        _name: &str,
        page_num: usize,
        total_pages: usize,
    ) {
        if page_num == 1 {
            self.activate_bar(source_num, total_sources, total_pages);
        }
        self.bar.set_position(page_num.saturating_sub(1) as u64);
    }

    fn on_source_complete(&self, source_num: usize, total_sources: usize, page_count: usize) {
        let elapsed_ms = self
            .source_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.set_position(page_count as u64);
        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            source_num,
            total_sources,
            dim(&format!("{page_count:>4} pages")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_ingest_complete(&self, total_sources: usize, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages from {} file(s)",
            green("✔"),
            bold(&total_pages.to_string()),
            total_sources
        );
    }

    fn on_ingest_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Build a book from several PDFs (ordered 1, 2, 10 by name)
  giftbook "parte 10.pdf" "parte 2.pdf" "parte 1.pdf" -o libro/

  # Open the book parts a hosting page embeds (JSON array of data URIs)
  giftbook --embedded book_data.json -o libro/

  # Number pages across the whole book instead of per file
  giftbook --numbering continuous *.pdf -o libro/

  # Bookmark pages 3 and 7, persisted between runs
  giftbook *.pdf --bookmarks-dir ~/.giftbook --toggle-bookmark 3 --toggle-bookmark 7

  # Page counts only, no rendering
  giftbook --inspect-only *.pdf

OUTPUT:
  With -o DIR the book is written as page-0001.png, page-0002.png, … plus
  flipbook.json holding the page-flip settings (camelCase keys), the page
  list and the bookmarked page indices. --inline-images embeds the pages in
  flipbook.json as PNG data URIs instead.

ENVIRONMENT VARIABLES:
  GIFTBOOK_*               Every flag below has a GIFTBOOK_ equivalent
  PDFIUM_LIB_PATH          Path to libpdfium (file or directory)
  PDFIUM_LOCATE_CACHE_DIR  Searched for libpdfium under <dir>/pdfium/
  RUST_LOG                 Overrides the log filter
"#;

/// Turn PDF files into a page-numbered, page-flip gift book.
#[derive(Parser, Debug)]
#[command(
    name = "giftbook",
    version,
    about = "Turn PDF files into a page-numbered, page-flip gift book",
    long_about = "Render every page of one or more PDF files, stamp each page with its number \
and assemble them, in natural file-name order, into one book ready for a page-flip viewer.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files. Non-PDF files are skipped.
    #[arg(conflicts_with = "embedded")]
    inputs: Vec<PathBuf>,

    /// JSON array of base64 data URIs to open instead of files.
    #[arg(long, env = "GIFTBOOK_EMBEDDED")]
    embedded: Option<PathBuf>,

    /// Export the book (PNG pages + flipbook.json) to this directory.
    #[arg(short, long, env = "GIFTBOOK_OUTPUT")]
    output: Option<PathBuf>,

    /// Oversampling factor; 1.0 is one pixel per PDF point.
    #[arg(long, env = "GIFTBOOK_SCALE", default_value_t = giftbook::config::DEFAULT_SCALE)]
    scale: f32,

    /// Page numbering: per-source (restart at 1 per file) or continuous.
    #[arg(long, env = "GIFTBOOK_NUMBERING", default_value = "per-source")]
    numbering: PageNumbering,

    /// Do not stamp page numbers.
    #[arg(long, env = "GIFTBOOK_NO_PAGE_NUMBERS")]
    no_page_numbers: bool,

    /// Viewer size used for the page-flip limits, e.g. 1280x800.
    #[arg(long, env = "GIFTBOOK_VIEWPORT", default_value = "1920x1080")]
    viewport: Viewport,

    /// Language of user-facing messages: es or en.
    #[arg(long, env = "GIFTBOOK_LOCALE", default_value = "es")]
    locale: Locale,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "GIFTBOOK_PASSWORD")]
    password: Option<String>,

    /// Directory for persisted bookmarks; without it bookmarks last one run.
    #[arg(long, env = "GIFTBOOK_BOOKMARKS_DIR")]
    bookmarks_dir: Option<PathBuf>,

    /// Storage key of the bookmark list.
    #[arg(long, env = "GIFTBOOK_BOOKMARK_KEY", default_value = giftbook::config::DEFAULT_BOOKMARK_KEY)]
    bookmark_key: String,

    /// Toggle the bookmark on this page (1-based); repeatable.
    #[arg(long = "toggle-bookmark", value_name = "PAGE")]
    toggle_bookmark: Vec<usize>,

    /// Print the bookmarked pages.
    #[arg(long)]
    list_bookmarks: bool,

    /// Embed pages in flipbook.json as data URIs instead of PNG files.
    #[arg(long, env = "GIFTBOOK_INLINE_IMAGES", requires = "output")]
    inline_images: bool,

    /// Path to the pdfium shared library, or its directory.
    #[arg(long, env = "GIFTBOOK_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print page counts only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Output a JSON summary instead of text.
    #[arg(long, env = "GIFTBOOK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "GIFTBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GIFTBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GIFTBOOK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── PDFium engine ────────────────────────────────────────────────────
    let decoder = match cli.pdfium_lib {
        Some(ref path) => PdfiumDecoder::with_library(path),
        None => PdfiumDecoder::new(),
    };
    tokio::task::block_in_place(|| decoder.ensure_available())
        .context("PDFium engine not available (set PDFIUM_LIB_PATH or --pdfium-lib)")?;
    let decoder: Arc<dyn DocumentDecoder> = Arc::new(decoder);

    let sources: Vec<DocumentSource> = cli.inputs.iter().map(DocumentSource::from_path).collect();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summaries = if let Some(ref manifest) = cli.embedded {
            let uris = load_embedded_manifest(manifest)
                .await
                .with_context(|| format!("Failed to read embedded book data from {:?}", manifest))?;
            inspect_embedded(uris.as_slice(), decoder, cli.password.clone()).await
        } else {
            inspect_uploads(sources, decoder, cli.password.clone()).await
        }
        .context("Failed to inspect PDFs")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summaries).context("Failed to serialize summary")?
            );
        } else {
            for s in &summaries {
                let size = s
                    .first_page_points
                    .map(|(w, h)| format!("{w:.0}×{h:.0} pt"))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<40} {:>5} pages  {}", s.name, s.page_count, dim(&size));
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn IngestProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let store: Arc<dyn KeyValueStore> = match cli.bookmarks_dir {
        Some(ref dir) => Arc::new(FileStore::new(dir)),
        None => Arc::new(MemoryStore::new()),
    };

    let mut session = ViewerSession::new(decoder, config, store)
        .with_viewport(cli.viewport)
        .with_widget_factory(widget_factory(&cli));

    // ── Open the book ────────────────────────────────────────────────────
    let opened = if let Some(ref manifest) = cli.embedded {
        let uris = load_embedded_manifest(manifest)
            .await
            .with_context(|| format!("Failed to read embedded book data from {:?}", manifest))?;
        session.open_embedded(uris.as_slice()).await
    } else {
        session.open_uploads(sources).await
    };
    if let Err(e) = opened {
        if let Some(alert) = session.alert() {
            eprintln!("{} {}", red("✘"), alert);
        }
        return Err(e).context("Could not open the book");
    }
    if session.widget().is_none() {
        anyhow::bail!("The book has no pages to show");
    }

    // ── Bookmarks ────────────────────────────────────────────────────────
    for &page in &cli.toggle_bookmark {
        let index = page
            .checked_sub(1)
            .context("Pages are 1-indexed, minimum is 1 (got 0)")?;
        let marked = session
            .toggle_bookmark(index)
            .with_context(|| format!("Failed to toggle bookmark on page {page}"))?;
        if !cli.quiet && !cli.json {
            eprintln!(
                "{} page {}",
                if marked { green("★ marked") } else { dim("☆ unmarked") },
                page
            );
        }
    }
    let bookmarks: Vec<usize> = session
        .bookmarks()
        .context("Failed to read bookmarks")?
        .into_iter()
        .map(|i| i + 1)
        .collect();

    // ── Report ───────────────────────────────────────────────────────────
    let stats = session.stats().cloned().unwrap_or_default();
    if cli.json {
        let summary = json!({
            "pages": session.page_count(),
            "stats": stats,
            "output": cli.output,
            "bookmarks": bookmarks,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if cli.list_bookmarks {
        if bookmarks.is_empty() {
            println!("No bookmarks");
        } else {
            let list: Vec<String> = bookmarks.iter().map(usize::to_string).collect();
            println!("Bookmarked pages: {}", list.join(", "));
        }
    }

    if !cli.quiet {
        let total = session.page_total_label().unwrap_or_default();
        match cli.output {
            Some(ref dir) => eprintln!(
                "{}  {} pages ({})  {}ms  →  {}",
                green("✔"),
                session.page_count(),
                total,
                stats.total_duration_ms,
                bold(&dir.display().to_string()),
            ),
            None if !show_progress => eprintln!(
                "Rendered {} pages from {} file(s) in {}ms",
                stats.pages, stats.sources, stats.total_duration_ms
            ),
            None => {}
        }
    }

    Ok(())
}

/// Map CLI args to `GiftBookConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GiftBookConfig> {
    let mut builder = GiftBookConfig::builder()
        .scale(cli.scale)
        .numbering(cli.numbering)
        .stamp_page_numbers(!cli.no_page_numbers)
        .locale(cli.locale)
        .bookmark_key(cli.bookmark_key.clone());

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Exporting widget with `--output`, in-memory otherwise.
fn widget_factory(cli: &Cli) -> WidgetFactory {
    match cli.output.clone() {
        Some(dir) => {
            let inline = cli.inline_images;
            Box::new(move || {
                Box::new(ExportFlipBook::new(dir.clone()).inline_images(inline))
                    as Box<dyn PageFlipWidget>
            })
        }
        None => Box::new(|| Box::new(MemoryFlipBook::new()) as Box<dyn PageFlipWidget>),
    }
}
