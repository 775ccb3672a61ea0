//! # board2pdf
//!
//! Export an image board (a Pinterest-style masonry page) as a folder of
//! full-resolution images, a justified HTML grid, and a single paginated PDF.
//!
//! ## Why this crate?
//!
//! Boards only show 236 px previews and load them lazily, so "print page"
//! produces a blurry, half-empty document. This crate reads the rendered
//! board once, fetches every pin at its original resolution (falling back to
//! the preview when the original is gone), lays the images out in rows of
//! equal height, and lets Chrome print that grid to A4.
//!
//! ## Pipeline Overview
//!
//! ```text
//! board URL / saved page
//!  │
//!  ├─ 1. Input    render the live page in Chrome, or read a saved copy
//!  ├─ 2. Extract  preview URLs after the grid marker → deduped originals
//!  ├─ 3. Fetch    one GET, one preview-tier fallback, failures logged
//!  ├─ 4. Measure  file name + width/height from the image header
//!  ├─ 5. Layout   justified rows (board2pdf-layout)
//!  ├─ 6. Compose  index.html with absolutely positioned <img>s
//!  └─ 7. Print    <dir>/<dir>.pdf via headless Chrome
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use board2pdf::{build_gallery, GalleryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GalleryConfig::builder().concurrency(4).build()?;
//!     let output = build_gallery(
//!         "https://www.pinterest.com/someone/cats/",
//!         "out/cats",
//!         &config,
//!     )
//!     .await?;
//!     eprintln!("{} images, {} failed", output.stats.fetched, output.stats.failed);
//!     for failed in output.errors.iter() {
//!         eprintln!("  {}", failed.url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `board2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! board2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod error;
pub mod gallery;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_helpers;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use board2pdf_layout::{layout, LastRowPolicy, LayoutBox, LayoutConfig, LayoutError, LayoutItem, LayoutResult};
pub use config::{GalleryConfig, GalleryConfigBuilder, PdfOptions, SourceConfig};
pub use context::RunContext;
pub use error::{Board2PdfError, ImageError};
pub use gallery::{build_gallery, build_gallery_from_markup, build_gallery_sync, build_gallery_with, summarize};
pub use output::{ErrorLog, FailedImage, GalleryOutput, GalleryStats, OutputFiles};
pub use pipeline::artifact::{build_artifact, derive_file_name, FileNamer, ImageArtifact};
pub use pipeline::compose::compose_page;
pub use pipeline::extract::{extract_urls, rewrite_tier, TierError, UrlExtractor};
pub use pipeline::fetch::{fetch_image, FetchOutcome, HttpError, HttpSource, ReqwestSource};
pub use pipeline::input::{resolve_markup, MarkupOrigin, ResolvedMarkup};
pub use pipeline::render::{ChromeRenderer, PageRenderer};
pub use progress::{FetchProgressCallback, FetchStatus, NoopProgressCallback, ProgressCallback};
pub use stream::{fetch_artifacts_stream, stream_from_markup, ArtifactEvent, ArtifactStream, FetchedArtifact};
