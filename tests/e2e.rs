//! End-to-end integration tests for board2pdf.
//!
//! The first group drives the whole pipeline through in-memory HTTP and
//! browser collaborators and always runs. The second group launches a real
//! headless Chrome; it is gated behind the `E2E_ENABLED` environment variable
//! so it does not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use board2pdf::{
    build_gallery_from_markup, build_gallery_with, Board2PdfError, ChromeRenderer,
    FetchProgressCallback, FetchStatus, GalleryConfig, GalleryOutput, HttpError, HttpSource,
    ImageError, LastRowPolicy, PageRenderer,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40])))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn original(path: &str) -> String {
    format!("https://i.pinimg.com/originals/{path}")
}

fn preview(path: &str) -> String {
    format!("https://i.pinimg.com/236x/{path}")
}

/// A board page whose grid references `paths` through preview URLs.
fn board(paths: &[&str]) -> String {
    let imgs: String = paths
        .iter()
        .map(|p| format!(r#"<div class="pin"><img src="{}" alt=""></div>"#, preview(p)))
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>board</title></head><body>
<header><img src="{}"></header>
<div class="Grid__Container">{imgs}</div>
</body></html>"#,
        preview("00/00/logo.png")
    )
}

#[derive(Default)]
struct FakeCdn {
    responses: HashMap<String, Result<Vec<u8>, HttpError>>,
    requests: Mutex<Vec<String>>,
}

impl FakeCdn {
    fn serve(mut self, url: String, body: Result<Vec<u8>, HttpError>) -> Self {
        self.responses.insert(url, body);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpSource for FakeCdn {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(HttpError::Status(404)))
    }
}

#[derive(Default)]
struct FakeBrowser {
    markup: String,
    printed: Mutex<usize>,
}

impl PageRenderer for FakeBrowser {
    async fn render_markup(&self, _url: &str) -> Result<String, Board2PdfError> {
        Ok(self.markup.clone())
    }

    async fn print_pdf(&self, _html_path: &Path) -> Result<Vec<u8>, Board2PdfError> {
        *self.printed.lock().unwrap() += 1;
        Ok(b"%PDF-1.7\n".to_vec())
    }
}

#[derive(Default)]
struct Trail(Mutex<String>);

impl FetchProgressCallback for Trail {
    fn on_image_done(&self, _index: usize, _total: usize, _url: &str, status: FetchStatus) {
        self.0.lock().unwrap().push(status.symbol());
    }
}

async fn run(cdn: &FakeCdn, markup: &str, dir: &Path, config: &GalleryConfig) -> GalleryOutput {
    build_gallery_from_markup(cdn, &FakeBrowser::default(), "https://www.pinterest.com/me/board/", markup, dir, config)
        .await
        .expect("export should succeed")
}

/// `src` attributes of the composed page, in document order.
fn img_sources(index_html: &str) -> Vec<String> {
    index_html
        .split("<img src=\"")
        .skip(1)
        .map(|rest| rest.split('"').next().unwrap().to_string())
        .collect()
}

// ── Pipeline tests (mocked collaborators) ────────────────────────────────────

#[tokio::test]
async fn test_fixture_board_geometry() {
    let cdn = FakeCdn::default()
        .serve(original("aa/wide.png"), Ok(png(1200, 800)))
        .serve(original("bb/tall.png"), Ok(png(800, 1200)))
        .serve(original("cc/square.png"), Ok(png(1000, 1000)));
    let tmp = tempfile::tempdir().unwrap();

    let out = run(
        &cdn,
        &board(&["aa/wide.png", "bb/tall.png", "cc/square.png"]),
        tmp.path(),
        &GalleryConfig::default(),
    )
    .await;

    let boxes = &out.layout.boxes;
    assert_eq!(out.layout.rows, 2);
    assert!((boxes[0].height - 6420.0 / 13.0).abs() < 1e-6);
    assert!((boxes[0].width - 9630.0 / 13.0).abs() < 1e-6);
    assert!((boxes[1].width - 4280.0 / 13.0).abs() < 1e-6);
    assert!((boxes[1].left - 9760.0 / 13.0).abs() < 1e-6);
    assert!((boxes[2].width - 1080.0).abs() < 1e-6);
    assert!((boxes[2].top - (6420.0 / 13.0 + 10.0)).abs() < 1e-6);
    assert!((out.layout.container_height - 20590.0 / 13.0).abs() < 1e-6);

    // The header logo above the marker is never requested.
    assert!(!cdn.requests().iter().any(|u| u.contains("logo")));
}

#[tokio::test]
async fn test_duplicates_are_fetched_once() {
    let cdn = FakeCdn::default()
        .serve(original("aa/1.png"), Ok(png(10, 10)))
        .serve(original("aa/2.png"), Ok(png(10, 10)))
        .serve(original("aa/3.png"), Ok(png(10, 10)));
    let tmp = tempfile::tempdir().unwrap();

    let out = run(
        &cdn,
        &board(&["aa/1.png", "aa/2.png", "aa/1.png", "aa/3.png"]),
        tmp.path(),
        &GalleryConfig::default(),
    )
    .await;

    assert_eq!(out.stats.candidates, 3);
    assert_eq!(cdn.requests().len(), 3);
}

#[tokio::test]
async fn test_fallback_to_preview_tier() {
    let cdn = FakeCdn::default()
        .serve(original("aa/gone.png"), Err(HttpError::Status(403)))
        .serve(preview("aa/gone.png"), Ok(png(300, 200)));
    let tmp = tempfile::tempdir().unwrap();

    let out = run(&cdn, &board(&["aa/gone.png"]), tmp.path(), &GalleryConfig::default()).await;

    assert_eq!(out.artifacts.len(), 1);
    let a = &out.artifacts[0];
    assert!(a.fell_back);
    assert_eq!(a.source_url, original("aa/gone.png"));
    assert_eq!((a.width, a.height), (300, 200));
    assert_eq!(out.stats.fell_back, 1);
    assert!(out.errors.is_empty());
    assert_eq!(cdn.requests(), vec![original("aa/gone.png"), preview("aa/gone.png")]);
}

#[tokio::test]
async fn test_total_failure_is_isolated() {
    let paths = ["aa/1.png", "aa/2.png", "aa/3.png", "aa/4.png", "aa/5.png"];
    let mut cdn = FakeCdn::default();
    for p in paths {
        if p != "aa/3.png" {
            cdn = cdn.serve(original(p), Ok(png(40, 30)));
        }
    }
    // aa/3.png: neither tier is served.
    let trail = Arc::new(Trail::default());
    let config = GalleryConfig::builder()
        .progress_callback(trail.clone())
        .build()
        .unwrap();
    let tmp = tempfile::tempdir().unwrap();

    let out = run(&cdn, &board(&paths), tmp.path(), &config).await;

    assert_eq!(out.artifacts.len(), 4);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors.urls(), vec![original("aa/3.png").as_str()]);
    assert!(matches!(
        out.errors.entries()[0].error,
        ImageError::FetchFailed { .. }
    ));
    assert_eq!(*trail.0.lock().unwrap(), "..x..");

    let index = std::fs::read_to_string(tmp.path().join("index.html")).unwrap();
    assert_eq!(img_sources(&index), vec!["1.png", "2.png", "4.png", "5.png"]);
}

#[tokio::test]
async fn test_unreadable_image_is_logged() {
    let cdn = FakeCdn::default()
        .serve(original("aa/ok.png"), Ok(png(20, 20)))
        .serve(original("aa/html.png"), Ok(b"<html>login wall</html>".to_vec()));
    let tmp = tempfile::tempdir().unwrap();

    let out = run(&cdn, &board(&["aa/ok.png", "aa/html.png"]), tmp.path(), &GalleryConfig::default()).await;

    assert_eq!(out.artifacts.len(), 1);
    assert!(matches!(
        out.errors.entries()[0].error,
        ImageError::UnsupportedFormat { .. }
    ));
    assert!(!tmp.path().join("html.png").exists());
}

#[tokio::test]
async fn test_colliding_file_names_are_kept_apart() {
    let cdn = FakeCdn::default()
        .serve(original("aa/pin.png"), Ok(png(10, 20)))
        .serve(original("bb/pin.png"), Ok(png(20, 10)));
    let tmp = tempfile::tempdir().unwrap();

    let out = run(&cdn, &board(&["aa/pin.png", "bb/pin.png"]), tmp.path(), &GalleryConfig::default()).await;

    let names: Vec<&str> = out.artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names[0], "pin.png");
    assert!(names[1].starts_with("pin-") && names[1].ends_with(".png"));

    let first = image::image_dimensions(tmp.path().join(names[0])).unwrap();
    let second = image::image_dimensions(tmp.path().join(names[1])).unwrap();
    assert_eq!(first, (10, 20));
    assert_eq!(second, (20, 10));
}

#[tokio::test]
async fn test_concurrency_does_not_change_result() {
    let paths = ["a/1.png", "b/2.png", "c/3.png", "d/4.png", "e/5.png", "f/6.png"];
    let sizes = [(1200, 800), (800, 1200), (1000, 1000), (640, 480), (480, 640), (900, 300)];
    let mut cdn = FakeCdn::default();
    for (p, (w, h)) in paths.iter().zip(sizes) {
        cdn = cdn.serve(original(p), Ok(png(w, h)));
    }
    cdn = cdn
        .serve(original("e/5.png"), Err(HttpError::Timeout))
        .serve(preview("e/5.png"), Ok(png(480, 640)));

    let seq_dir = tempfile::tempdir().unwrap();
    let par_dir = tempfile::tempdir().unwrap();
    let seq = run(&cdn, &board(&paths), seq_dir.path(), &GalleryConfig::default()).await;
    let par_config = GalleryConfig::builder().concurrency(4).build().unwrap();
    let par = run(&cdn, &board(&paths), par_dir.path(), &par_config).await;

    assert_eq!(seq.artifacts, par.artifacts);
    assert_eq!(seq.layout, par.layout);
}

#[tokio::test]
async fn test_keep_target_height_last_row() {
    let cdn = FakeCdn::default()
        .serve(original("aa/wide.png"), Ok(png(1200, 800)))
        .serve(original("bb/tall.png"), Ok(png(800, 1200)))
        .serve(original("cc/square.png"), Ok(png(1000, 1000)));
    let config = GalleryConfig::builder()
        .last_row(LastRowPolicy::KeepTargetHeight)
        .build()
        .unwrap();
    let tmp = tempfile::tempdir().unwrap();

    let out = run(
        &cdn,
        &board(&["aa/wide.png", "bb/tall.png", "cc/square.png"]),
        tmp.path(),
        &config,
    )
    .await;

    let last = &out.layout.boxes[2];
    assert!((last.height - 450.0).abs() < 1e-6);
    assert!((last.width - 450.0).abs() < 1e-6);
    assert_eq!(last.left, 0.0);
}

#[tokio::test]
async fn test_manifest_matches_output() {
    let cdn = FakeCdn::default().serve(original("aa/1.png"), Ok(png(64, 48)));
    let tmp = tempfile::tempdir().unwrap();

    let out = run(&cdn, &board(&["aa/1.png", "aa/missing.png"]), tmp.path(), &GalleryConfig::default()).await;

    let manifest = std::fs::read_to_string(tmp.path().join("gallery.json")).unwrap();
    let parsed: GalleryOutput = serde_json::from_str(&manifest).unwrap();
    assert_eq!(parsed.artifacts, out.artifacts);
    assert_eq!(parsed.errors, out.errors);
    assert_eq!(parsed.stats.failed, 1);
}

#[tokio::test]
async fn test_saved_page_input() {
    let tmp = tempfile::tempdir().unwrap();
    let saved = tmp.path().join("saved.html");
    std::fs::write(&saved, board(&["aa/1.png"])).unwrap();
    let cdn = FakeCdn::default().serve(original("aa/1.png"), Ok(png(5, 5)));
    let browser = FakeBrowser::default();

    let out = build_gallery_with(
        &cdn,
        &browser,
        saved.to_str().unwrap(),
        tmp.path().join("out"),
        &GalleryConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(out.artifacts.len(), 1);
    assert_eq!(*browser.printed.lock().unwrap(), 1);
    assert!(tmp.path().join("out/out.pdf").is_file());
}

#[tokio::test]
async fn test_board_without_marker_is_fatal() {
    let browser = FakeBrowser {
        markup: "<html><body>Log in to see this board</body></html>".into(),
        ..Default::default()
    };
    let tmp = tempfile::tempdir().unwrap();

    let err = build_gallery_with(
        &FakeCdn::default(),
        &browser,
        "https://www.pinterest.com/me/private/",
        tmp.path(),
        &GalleryConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Board2PdfError::MarkerNotFound { .. }));
    assert_eq!(*browser.printed.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_board_still_composes() {
    let tmp = tempfile::tempdir().unwrap();
    let out = run(&FakeCdn::default(), &board(&[]), tmp.path(), &GalleryConfig::default()).await;

    assert!(out.artifacts.is_empty());
    assert_eq!(out.layout.rows, 0);
    assert!(tmp.path().join("index.html").is_file());
}

// ── Live Chrome tests (E2E_ENABLED) ─────────────────────────────────────────

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

#[tokio::test]
async fn test_chrome_prints_composed_grid() {
    e2e_skip_unless_enabled!();

    let cdn = FakeCdn::default()
        .serve(original("aa/wide.png"), Ok(png(1200, 800)))
        .serve(original("bb/tall.png"), Ok(png(800, 1200)))
        .serve(original("cc/square.png"), Ok(png(1000, 1000)));
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("live");
    let config = GalleryConfig::builder().settle_ms(0).build().unwrap();
    let renderer = ChromeRenderer::new(&config);

    let out = build_gallery_from_markup(
        &cdn,
        &renderer,
        "live",
        &board(&["aa/wide.png", "bb/tall.png", "cc/square.png"]),
        &dir,
        &config,
    )
    .await
    .expect("live export should succeed");

    let pdf_path = out.files.pdf.expect("pdf path");
    let pdf = std::fs::read(&pdf_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"), "not a PDF: {}", pdf_path.display());
    println!("PDF: {} ({} bytes)", pdf_path.display(), pdf.len());
}

#[tokio::test]
async fn test_chrome_serialises_page() {
    e2e_skip_unless_enabled!();

    let tmp = tempfile::tempdir().unwrap();
    let page = tmp.path().join("board.html");
    std::fs::write(
        &page,
        r#"<html><body><div id="root"></div>
<script>document.getElementById('root').innerHTML = '<div class="Grid__Container">late</div>';</script>
</body></html>"#,
    )
    .unwrap();

    let config = GalleryConfig::builder().settle_ms(200).build().unwrap();
    let renderer = ChromeRenderer::new(&config);
    let url = format!("file://{}", page.display());
    let markup = renderer.render_markup(&url).await.expect("render should succeed");

    assert!(markup.contains(r#"class="Grid__Container""#));
    assert!(markup.contains("late"));
}
