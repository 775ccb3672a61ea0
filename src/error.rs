//! Error types for the board2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Board2PdfError`] — **Fatal**: the run cannot produce anything useful
//!   (board markup has no gallery container, browser failed to start, the
//!   output directory is not writable). Returned as `Err(Board2PdfError)`
//!   from the top-level `build_gallery*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single image could not be fetched or
//!   measured, but every other image is fine. Stored in the run's
//!   [`crate::output::ErrorLog`] so one broken pin never costs the whole board.

use board2pdf_layout::LayoutError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the board2pdf library.
///
/// Per-image failures use [`ImageError`] and are collected in
/// [`crate::output::ErrorLog`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Board2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input string is neither an HTTP(S) URL nor an existing file.
    #[error("Invalid input '{input}': not a saved page path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// A saved board page was not found at the given path.
    #[error("Board page not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The markup does not contain the gallery container marker.
    ///
    /// Usually means the board's DOM changed upstream; retrying won't help.
    #[error("Gallery container marker {marker:?} not found in page markup\nThe board layout may have changed.")]
    MarkerNotFound { marker: String },

    // ── Browser errors ────────────────────────────────────────────────────
    /// Headless browser could not load or serialise the board page.
    #[error("Failed to render '{url}': {detail}")]
    RenderFailed { url: String, detail: String },

    /// Headless browser could not print the composed gallery to PDF.
    #[error("Failed to print PDF from '{path}': {detail}")]
    PdfFailed { path: PathBuf, detail: String },

    // ── Layout errors ─────────────────────────────────────────────────────
    /// The layout engine rejected its inputs.
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    /// A layout box has no artifact with a matching key.
    #[error("Layout box {key} has no matching image artifact")]
    AlignmentMismatch { key: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// Stored in [`crate::output::ErrorLog`]; the run continues with the next URL.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// Both the full-resolution URL and its preview-tier fallback failed.
    #[error("{url}: fetch failed ({primary}); fallback failed ({fallback})")]
    FetchFailed {
        url: String,
        primary: String,
        fallback: String,
    },

    /// The fetched bytes are not in an image format this build can measure.
    #[error("{url}: unsupported image format")]
    UnsupportedFormat { url: String },

    /// The header was recognised but dimensions could not be read.
    #[error("{url}: unreadable image: {detail}")]
    UnreadableImage { url: String, detail: String },

    /// No file name could be derived from the URL path.
    #[error("{url}: cannot derive a file name")]
    InvalidFileName { url: String },

    /// The image was fetched but could not be saved.
    #[error("{url}: failed to save image: {detail}")]
    WriteFailed { url: String, detail: String },
}

impl ImageError {
    /// The candidate URL this error belongs to.
    pub fn url(&self) -> &str {
        match self {
            ImageError::FetchFailed { url, .. }
            | ImageError::UnsupportedFormat { url }
            | ImageError::UnreadableImage { url, .. }
            | ImageError::InvalidFileName { url }
            | ImageError::WriteFailed { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_not_found_display() {
        let e = Board2PdfError::MarkerNotFound {
            marker: "class=\"Grid__Container\"".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Grid__Container"), "got: {msg}");
    }

    #[test]
    fn layout_error_converts() {
        let e: Board2PdfError = LayoutError::InvalidConfig("container_width".into()).into();
        assert!(matches!(e, Board2PdfError::Layout(_)));
        assert!(e.to_string().contains("container_width"));
    }

    #[test]
    fn fetch_failed_display_mentions_both_attempts() {
        let e = ImageError::FetchFailed {
            url: "https://i.pinimg.com/originals/a/b.jpg".into(),
            primary: "HTTP 404".into(),
            fallback: "HTTP 403".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("403"));
    }

    #[test]
    fn image_error_exposes_url() {
        let e = ImageError::UnsupportedFormat {
            url: "https://i.pinimg.com/originals/x.bin".into(),
        };
        assert_eq!(e.url(), "https://i.pinimg.com/originals/x.bin");
    }

    #[test]
    fn image_error_serialises() {
        let e = ImageError::InvalidFileName {
            url: "https://i.pinimg.com/originals/".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("InvalidFileName"));
    }
}
