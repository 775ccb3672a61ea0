//! Result types returned by the `build_gallery*` entry points.
//!
//! Everything here is `Serialize`: the CLI's `--json` mode and the
//! `gallery.json` manifest are both just [`GalleryOutput`] through serde_json.

use crate::error::ImageError;
use crate::pipeline::artifact::ImageArtifact;
use board2pdf_layout::LayoutResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One candidate URL that produced no artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedImage {
    /// Index of the URL in the deduplicated candidate list.
    pub source_order: usize,
    pub url: String,
    pub error: ImageError,
}

/// Append-only record of per-image failures, in board order.
///
/// Nothing in here ever aborts a run; the log is reported once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLog {
    entries: Vec<FailedImage>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source_order: usize, error: ImageError) {
        self.entries.push(FailedImage {
            source_order,
            url: error.url().to_string(),
            error,
        });
    }

    pub fn entries(&self) -> &[FailedImage] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailedImage> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Failed URLs in board order.
    pub fn urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.url.as_str()).collect()
    }
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryStats {
    /// Unique candidate URLs found after the gallery marker.
    pub candidates: usize,
    /// Artifacts produced (including fallbacks).
    pub fetched: usize,
    /// Artifacts served by the preview-tier fallback.
    pub fell_back: usize,
    /// Candidates that produced no artifact.
    pub failed: usize,
    pub rows: usize,
    pub container_height: f64,
    pub fetch_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Paths of everything written to the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub dir: PathBuf,
    pub raw_html: PathBuf,
    pub index_html: PathBuf,
    pub manifest: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
}

/// The complete result of one board-to-PDF run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryOutput {
    /// Board URL (or saved page path); also the HTML `<title>`.
    pub title: String,
    /// Successful images in board order.
    pub artifacts: Vec<ImageArtifact>,
    pub layout: LayoutResult,
    pub errors: ErrorLog,
    pub stats: GalleryStats,
    pub files: OutputFiles,
}
