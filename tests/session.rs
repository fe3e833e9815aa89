//! The viewer session end to end, with a scripted decoder.

mod common;

use common::*;
use giftbook::widget::MANIFEST_FILE;
use giftbook::{
    DocumentSource, ExportFlipBook, ExportManifest, FileStore, GiftBookConfig, GiftBookError,
    KeyValueStore, Locale, MemoryStore, PageFlipWidget, Screen, ViewerSession, Viewport, Zoom,
};
use std::sync::Arc;

fn session() -> ViewerSession {
    ViewerSession::new(
        Arc::new(FakeDecoder::default()),
        small_config(),
        Arc::new(MemoryStore::new()),
    )
}

async fn open_book(pages: &[usize]) -> ViewerSession {
    let mut s = session();
    let sources = pages
        .iter()
        .enumerate()
        .map(|(i, &n)| pdf_source(&format!("{}.pdf", i + 1), n))
        .collect();
    s.open_uploads(sources).await.unwrap();
    s
}

#[tokio::test]
async fn empty_selection_is_a_no_op() {
    let mut s = session();
    s.open_uploads(Vec::new()).await.unwrap();
    assert_eq!(s.screen(), Screen::Selection);
    assert!(s.alert().is_none());
}

#[tokio::test]
async fn non_pdf_selection_stays_on_selection_screen() {
    let mut s = session();
    let err = s
        .open_uploads(vec![DocumentSource::from_bytes(
            "carta.docx",
            Some("application/msword"),
            b"PK".to_vec(),
        )])
        .await
        .unwrap_err();

    assert!(matches!(err, GiftBookError::NoPdfSelected { .. }));
    assert_eq!(s.screen(), Screen::Selection);
    assert_eq!(s.alert(), Some("Por favor selecciona archivos PDF válidos."));
    assert!(s.widget().is_none());
}

#[tokio::test]
async fn opening_shows_the_viewer() {
    let s = open_book(&[3, 2]).await;
    assert_eq!(s.screen(), Screen::Viewer);
    assert_eq!(s.page_count(), 5);
    assert_eq!(s.current_page(), Some(0));
    assert_eq!(s.page_input(), 1);
    assert_eq!(s.page_total_label().as_deref(), Some("de 5"));
    assert_eq!(s.stats().unwrap().pages_per_source, vec![3, 2]);
    assert_eq!(
        s.loading_status(),
        "Archivo 2/2 (2.pdf): Renderizando página 2/2..."
    );
}

#[tokio::test]
async fn failed_source_returns_to_selection() {
    let mut s = session();
    s.open_uploads(vec![pdf_source("ok.pdf", 1)]).await.unwrap();
    assert_eq!(s.screen(), Screen::Viewer);

    let sources = vec![
        pdf_source("1.pdf", 2),
        DocumentSource::from_bytes("2.pdf", Some("application/pdf"), failing_pdf(2, 1)),
        pdf_source("3.pdf", 2),
    ];
    let err = s.open_uploads(sources).await.unwrap_err();

    assert_eq!(err.kind(), giftbook::ErrorKind::Render);
    assert_eq!(s.screen(), Screen::Selection);
    assert!(s.widget().is_none());
    assert_eq!(s.page_count(), 0);
    assert!(s.alert().unwrap().starts_with("Error al procesar los PDFs: "));
}

#[tokio::test]
async fn undecodable_middle_source_aborts_before_the_next_one() {
    init_logging();
    let decoder = Arc::new(FakeDecoder::default());
    let mut s = ViewerSession::new(
        decoder.clone(),
        small_config(),
        Arc::new(MemoryStore::new()),
    );

    let sources = vec![
        pdf_source("1.pdf", 2),
        DocumentSource::from_bytes("2.pdf", Some("application/pdf"), b"<html>".to_vec()),
        pdf_source("3.pdf", 2),
    ];
    let err = s.open_uploads(sources).await.unwrap_err();

    assert!(matches!(err, GiftBookError::NotAPdf { ref name, .. } if name == "2.pdf"));
    assert_eq!(err.kind(), giftbook::ErrorKind::Decode);
    assert_eq!(s.screen(), Screen::Selection);
    assert!(s.widget().is_none());
    assert_eq!(s.page_count(), 0);
    assert!(s.alert().unwrap().starts_with("Error al procesar los PDFs: "));
    assert_eq!(*decoder.opened.lock().unwrap(), vec!["1.pdf".to_string()]);
}

#[tokio::test]
async fn corrupt_middle_source_is_a_decode_error() {
    init_logging();
    let decoder = Arc::new(FakeDecoder::default());
    let mut s = ViewerSession::new(
        decoder.clone(),
        small_config(),
        Arc::new(MemoryStore::new()),
    );

    let sources = vec![
        pdf_source("1.pdf", 1),
        DocumentSource::from_bytes(
            "2.pdf",
            Some("application/pdf"),
            b"%PDF-fake\nxref broken".to_vec(),
        ),
        pdf_source("3.pdf", 1),
    ];
    let err = s.open_uploads(sources).await.unwrap_err();

    assert!(matches!(err, GiftBookError::CorruptPdf { ref name, .. } if name == "2.pdf"));
    assert_eq!(err.kind(), giftbook::ErrorKind::Decode);
    assert_eq!(s.screen(), Screen::Selection);
    assert!(s.widget().is_none());
    assert_eq!(
        *decoder.opened.lock().unwrap(),
        vec!["1.pdf".to_string(), "2.pdf".to_string()]
    );
}

#[tokio::test]
async fn navigation_moves_by_spread() {
    let mut s = open_book(&[6]).await;
    s.next_page();
    assert_eq!(s.current_page(), Some(1));
    assert_eq!(s.page_input(), 2);
    s.next_page();
    assert_eq!(s.current_page(), Some(3));
    s.prev_page();
    assert_eq!(s.current_page(), Some(1));
}

#[tokio::test]
async fn page_jump_is_bounded() {
    let mut s = open_book(&[10]).await;

    s.go_to_page("5").unwrap();
    assert_eq!(s.current_page(), Some(3));
    assert_eq!(s.page_input(), 4);

    let err = s.go_to_page("12").unwrap_err();
    assert!(matches!(err, GiftBookError::PageOutOfRange { page: 12, total: 10 }));
    assert_eq!(
        s.alert(),
        Some("Página 12 fuera de rango. El libro tiene 10 páginas.")
    );
    assert_eq!(s.current_page(), Some(3));

    assert!(matches!(s.go_to_page("0"), Err(GiftBookError::PageOutOfRange { page: 0, .. })));
    assert!(matches!(s.go_to_page("-3"), Err(GiftBookError::PageOutOfRange { .. })));
    assert!(matches!(s.go_to_page("abc"), Err(GiftBookError::InvalidPageInput { .. })));

    s.go_to_page(" 10 ").unwrap();
    assert_eq!(s.current_page(), Some(9));
}

#[tokio::test]
async fn page_jump_needs_a_book() {
    let mut s = session();
    assert!(matches!(s.go_to_page("1"), Err(GiftBookError::NoBookOpen)));
}

#[tokio::test]
async fn zoom_toggles_and_reset_clears_it() {
    let mut s = open_book(&[2]).await;
    assert_eq!(s.zoom(), Zoom::Normal);
    s.zoom_in();
    assert_eq!(s.zoom().css_transform(), "scale(1.4)");
    s.zoom_out();
    assert_eq!(s.zoom(), Zoom::Normal);

    s.zoom_in();
    s.reset();
    assert_eq!(s.zoom(), Zoom::Normal);
    assert_eq!(s.screen(), Screen::Selection);
    assert_eq!(s.page_input(), 0);
}

#[tokio::test]
async fn bookmarks_toggle_and_persist_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));

    let mut s = ViewerSession::new(Arc::new(FakeDecoder::default()), small_config(), store.clone());
    s.open_uploads(vec![pdf_source("a.pdf", 5)]).await.unwrap();

    assert!(s.toggle_bookmark(3).unwrap());
    assert!(s.toggle_bookmark(0).unwrap());
    assert!(s.is_bookmarked(3).unwrap());
    assert_eq!(s.bookmarks().unwrap(), vec![0, 3]);
    assert_eq!(store.get("current_book").unwrap().as_deref(), Some("[3,0]"));

    // A new session over the same directory sees the same marks.
    let reopened = ViewerSession::new(
        Arc::new(FakeDecoder::default()),
        small_config(),
        Arc::new(FileStore::new(dir.path())),
    );
    assert_eq!(reopened.bookmarks().unwrap(), vec![0, 3]);
}

#[tokio::test]
async fn bookmark_toggle_twice_is_identity() {
    let store = Arc::new(MemoryStore::new());
    let mut s = ViewerSession::new(Arc::new(FakeDecoder::default()), small_config(), store.clone());
    s.open_uploads(vec![pdf_source("a.pdf", 4)]).await.unwrap();
    s.toggle_bookmark(1).unwrap();
    let before = store.get("current_book").unwrap();

    assert!(s.toggle_bookmark(2).unwrap());
    assert!(!s.toggle_bookmark(2).unwrap());

    assert_eq!(store.get("current_book").unwrap(), before);
}

#[tokio::test]
async fn repeated_stored_marks_are_listed_once() {
    let store = Arc::new(MemoryStore::new());
    store.set("current_book", "[2,2,0]").unwrap();
    let mut s = ViewerSession::new(Arc::new(FakeDecoder::default()), small_config(), store.clone());
    s.open_uploads(vec![pdf_source("a.pdf", 4)]).await.unwrap();

    assert_eq!(s.bookmarks().unwrap(), vec![0, 2]);
    assert!(!s.toggle_bookmark(2).unwrap());
    assert_eq!(s.bookmarks().unwrap(), vec![0]);
    assert_eq!(store.get("current_book").unwrap().as_deref(), Some("[0]"));
}

#[tokio::test]
async fn bookmark_outside_the_book_is_rejected() {
    let mut s = open_book(&[2]).await;
    assert!(matches!(
        s.toggle_bookmark(2),
        Err(GiftBookError::PageOutOfRange { page: 3, total: 2 })
    ));
}

#[tokio::test]
async fn bookmark_key_is_configurable() {
    let store = Arc::new(MemoryStore::new());
    let config = GiftBookConfig::builder()
        .scale(1.0)
        .bookmark_key("regalo")
        .build()
        .unwrap();
    let mut s = ViewerSession::new(Arc::new(FakeDecoder::default()), config, store.clone());
    s.open_uploads(vec![pdf_source("a.pdf", 2)]).await.unwrap();
    s.toggle_bookmark(1).unwrap();

    assert_eq!(store.get("regalo").unwrap().as_deref(), Some("[1]"));
    assert_eq!(store.get("current_book").unwrap(), None);
}

#[tokio::test]
async fn embedded_book_opens_and_failures_revert() {
    let mut s = session();
    s.open_embedded(&[data_uri(2), data_uri(3)]).await.unwrap();
    assert_eq!(s.page_count(), 5);
    assert_eq!(
        s.loading_status(),
        "Archivo 2/2: Renderizando página 3/3..."
    );

    let err = s.open_embedded(&["data:application/pdf,plain"]).await.unwrap_err();
    assert!(matches!(err, GiftBookError::InvalidDataUri { index: 1, .. }));
    assert_eq!(s.screen(), Screen::Selection);
    assert!(s.alert().unwrap().starts_with("Error cargando el libro regalo: "));
}

#[tokio::test]
async fn no_embedded_parts_does_nothing() {
    let mut s = session();
    let none: [&str; 0] = [];
    s.open_embedded(&none).await.unwrap();
    assert_eq!(s.screen(), Screen::Selection);
}

#[tokio::test]
async fn widget_settings_follow_the_viewport() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().to_path_buf();
    let mut s = session()
        .with_viewport(Viewport {
            width: 1000.0,
            height: 500.0,
        })
        .with_widget_factory(Box::new(move || {
            Box::new(ExportFlipBook::new(out.clone())) as Box<dyn PageFlipWidget>
        }));
    s.open_uploads(vec![pdf_source("a.pdf", 3)]).await.unwrap();
    s.toggle_bookmark(2).unwrap();

    let manifest = ExportManifest::read(dir.path()).unwrap();
    assert_eq!(manifest.page_count, 3);
    assert_eq!((manifest.settings.width, manifest.settings.height), (200, 400));
    assert!((manifest.settings.max_width - 350.0).abs() < 1e-3);
    assert!((manifest.settings.max_height - 300.0).abs() < 1e-3);
    assert_eq!(manifest.bookmarks, vec![2]);
    assert!(dir.path().join(MANIFEST_FILE).exists());
    assert!(dir.path().join("page-0003.png").exists());
}

#[tokio::test]
async fn english_messages() {
    let config = GiftBookConfig::builder()
        .scale(1.0)
        .locale(Locale::En)
        .build()
        .unwrap();
    let mut s = ViewerSession::new(
        Arc::new(FakeDecoder::default()),
        config,
        Arc::new(MemoryStore::new()),
    );
    s.open_uploads(vec![pdf_source("a.pdf", 2)]).await.unwrap();
    assert_eq!(s.page_total_label().as_deref(), Some("of 2"));
    let _ = s.go_to_page("9");
    assert_eq!(s.alert(), Some("Page 9 is out of range. The book has 2 pages."));
}

#[test]
fn blocking_callers_can_drive_a_session() {
    let mut s = session();
    tokio_test::block_on(s.open_uploads(vec![pdf_source("a.pdf", 1)])).unwrap();
    assert_eq!(s.page_count(), 1);
}
