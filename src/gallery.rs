//! Eager (whole-board) entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: give it a board and an output
//! directory, get back a [`GalleryOutput`] once the PDF is printed. It owns
//! the whole run: markup, images, `index.html`, `gallery.json` and the PDF.
//! Use [`crate::stream::fetch_artifacts_stream`] instead when you only want
//! the measured images and will handle persistence yourself.

use crate::config::GalleryConfig;
use crate::context::RunContext;
use crate::error::Board2PdfError;
use crate::output::{GalleryOutput, GalleryStats, OutputFiles};
use crate::pipeline::compose::compose_page;
use crate::pipeline::extract::UrlExtractor;
use crate::pipeline::fetch::{HttpSource, ReqwestSource};
use crate::pipeline::input::resolve_markup;
use crate::pipeline::render::{ChromeRenderer, PageRenderer};
use crate::stream::fetch_artifacts_stream;
use board2pdf_layout::{layout, LayoutItem};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const RAW_HTML: &str = "raw.html";
pub const INDEX_HTML: &str = "index.html";
pub const MANIFEST_JSON: &str = "gallery.json";

/// Turn a board URL or saved page into an image folder, a grid page and a PDF.
///
/// This is the primary entry point for the library. It uses `reqwest` for
/// images and a local Chrome for rendering and printing.
///
/// # Returns
/// `Ok(GalleryOutput)` even if some images failed (see `output.errors`).
///
/// # Errors
/// Only fatal problems: unreadable input, missing gallery marker, browser
/// failures, or an unwritable output directory.
pub async fn build_gallery(
    input: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &GalleryConfig,
) -> Result<GalleryOutput, Board2PdfError> {
    let source = ReqwestSource::new(config)?;
    let renderer = ChromeRenderer::new(config);
    build_gallery_with(&source, &renderer, input, output_dir, config).await
}

/// [`build_gallery`] with caller-supplied HTTP and browser collaborators.
pub async fn build_gallery_with<S: HttpSource, R: PageRenderer>(
    source: &S,
    renderer: &R,
    input: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &GalleryConfig,
) -> Result<GalleryOutput, Board2PdfError> {
    let total_start = Instant::now();
    info!("Starting board export: {}", input.as_ref());

    let resolved = resolve_markup(input.as_ref(), renderer).await?;
    let mut output = build_gallery_from_markup(
        source,
        renderer,
        &resolved.title,
        &resolved.markup,
        output_dir,
        config,
    )
    .await?;

    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Run every stage after markup acquisition.
///
/// `title` becomes the composed page's `<title>`.
pub async fn build_gallery_from_markup<S: HttpSource, R: PageRenderer>(
    source: &S,
    renderer: &R,
    title: &str,
    markup: &str,
    output_dir: impl AsRef<Path>,
    config: &GalleryConfig,
) -> Result<GalleryOutput, Board2PdfError> {
    let total_start = Instant::now();
    let dir = output_dir.as_ref();

    // ── Step 1: Output directory + raw markup ────────────────────────────
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Board2PdfError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    let raw_html = dir.join(RAW_HTML);
    write_file(&raw_html, markup.as_bytes()).await?;

    // ── Step 2: Extract candidate URLs ───────────────────────────────────
    let urls = UrlExtractor::new(&config.source)?.extract(markup)?;
    let total = urls.len();
    info!("Found {} candidate images", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_fetch_start(total);
    }

    // ── Step 3: Fetch, measure, persist ──────────────────────────────────
    let fetch_start = Instant::now();
    let pdf_path = pdf_path_for(dir);
    let pdf_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut ctx = RunContext::with_reserved_names([RAW_HTML, INDEX_HTML, MANIFEST_JSON, pdf_name.as_str()]);
    let mut events = fetch_artifacts_stream(source, urls, config);

    while let Some(event) = events.next().await {
        let index = event.index;
        let url = event.url.clone();
        let status = ctx.record(event, dir).await;
        debug!("[{}/{}] {} {}", index + 1, total, status.symbol(), url);

        if let Some(ref cb) = config.progress_callback {
            cb.on_image_done(index, total, &url, status);
        }
    }
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    let fell_back = ctx.fell_back();
    let (artifacts, errors) = ctx.into_parts();

    if let Some(ref cb) = config.progress_callback {
        cb.on_fetch_complete(total, artifacts.len());
    }
    info!(
        "Fetched {}/{} images ({} via fallback) in {}ms",
        artifacts.len(),
        total,
        fell_back,
        fetch_duration_ms
    );
    if !errors.is_empty() {
        warn!("{} images could not be included", errors.len());
    }

    // ── Step 4: Layout + compose ─────────────────────────────────────────
    let items: Vec<LayoutItem> = artifacts
        .iter()
        .map(|a| LayoutItem::new(a.source_order, a.width as f64, a.height as f64))
        .collect();
    let grid = layout(&items, &config.layout)?;
    debug!(
        "Laid out {} images in {} rows, {:.2}px tall",
        items.len(),
        grid.rows,
        grid.container_height
    );

    let page = compose_page(title, &artifacts, &grid, config.layout.container_width)?;
    let index_html = dir.join(INDEX_HTML);
    write_file(&index_html, page.as_bytes()).await?;

    // ── Step 5: Print ────────────────────────────────────────────────────
    let render_start = Instant::now();
    let pdf = if config.render_pdf {
        let bytes = renderer.print_pdf(&index_html).await?;
        write_file(&pdf_path, &bytes).await?;
        info!("Wrote {} ({} bytes)", pdf_path.display(), bytes.len());
        Some(pdf_path)
    } else {
        None
    };
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    // ── Step 6: Assemble + manifest ──────────────────────────────────────
    let stats = GalleryStats {
        candidates: total,
        fetched: artifacts.len(),
        fell_back,
        failed: errors.len(),
        rows: grid.rows,
        container_height: grid.container_height,
        fetch_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    let mut output = GalleryOutput {
        title: title.to_string(),
        artifacts,
        layout: grid,
        errors,
        stats,
        files: OutputFiles {
            dir: dir.to_path_buf(),
            raw_html,
            index_html,
            manifest: None,
            pdf,
        },
    };

    if config.write_manifest {
        let manifest = dir.join(MANIFEST_JSON);
        output.files.manifest = Some(manifest.clone());
        let json = serde_json::to_vec_pretty(&output)
            .map_err(|e| Board2PdfError::Internal(format!("manifest serialisation: {e}")))?;
        write_file(&manifest, &json).await?;
    }

    info!(
        "Board export complete: {} images, {} failed, {}ms",
        output.stats.fetched, output.stats.failed, output.stats.total_duration_ms
    );

    Ok(output)
}

/// Synchronous wrapper around [`build_gallery`].
///
/// Creates a temporary tokio runtime internally.
pub fn build_gallery_sync(
    input: impl AsRef<str>,
    output_dir: impl AsRef<Path>,
    config: &GalleryConfig,
) -> Result<GalleryOutput, Board2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Board2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build_gallery(input, output_dir, config))
}

/// `<dir>/<dir basename>.pdf`, e.g. `out/cats/cats.pdf`.
pub fn pdf_path_for(dir: &Path) -> PathBuf {
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            std::path::absolute(dir)
                .ok()
                .and_then(|abs| abs.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .unwrap_or_else(|| "gallery".to_string());
    dir.join(format!("{base}.pdf"))
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Board2PdfError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| Board2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Summary line for a finished fetch: `"12 fetched, 2 via fallback, 1 failed"`.
pub fn summarize(output: &GalleryOutput) -> String {
    let s = &output.stats;
    format!(
        "{} fetched, {} via fallback, {} failed",
        s.fetched, s.fell_back, s.failed
    )
}
