//! Progress-callback trait for per-image fetch events.
//!
//! Inject an [`Arc<dyn FetchProgressCallback>`] via
//! [`crate::config::GalleryConfigBuilder::progress_callback`] to receive one
//! event per candidate URL as the fetch stage works through the board.
//!
//! # Why callbacks instead of channels?
//!
//! A callback keeps the library ignorant of how the host communicates. The
//! CLI turns events into a progress bar; tests just count them.
//!
//! # Example
//!
//! ```rust
//! use board2pdf::{FetchProgressCallback, FetchStatus, GalleryConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     fell_back: AtomicUsize,
//! }
//!
//! impl FetchProgressCallback for CountingCallback {
//!     fn on_image_done(&self, _index: usize, _total: usize, _url: &str, status: FetchStatus) {
//!         if status == FetchStatus::FellBack {
//!             self.fell_back.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { fell_back: AtomicUsize::new(0) });
//!
//! let config = GalleryConfig::builder()
//!     .progress_callback(counter as Arc<dyn FetchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a single candidate URL ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Full-resolution image fetched and measured.
    Fetched,
    /// Full-resolution fetch failed; the preview tier was used instead.
    FellBack,
    /// Nothing usable came back (both fetches failed, or bytes unreadable).
    Failed,
}

impl FetchStatus {
    /// One-character progress symbol: `.` fetched, `!` fell back, `x` failed.
    pub fn symbol(self) -> char {
        match self {
            FetchStatus::Fetched => '.',
            FetchStatus::FellBack => '!',
            FetchStatus::Failed => 'x',
        }
    }
}

/// Called by the fetch stage as it processes each candidate URL.
///
/// Events arrive in board order. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait FetchProgressCallback: Send + Sync {
    /// Called once, after extraction, before any image is requested.
    fn on_fetch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called once per candidate URL.
    ///
    /// # Arguments
    /// * `index`  — 0-based position in the deduplicated URL list
    /// * `total`  — number of candidate URLs
    /// * `url`    — the full-resolution candidate URL
    /// * `status` — outcome, see [`FetchStatus::symbol`]
    fn on_image_done(&self, index: usize, total: usize, url: &str, status: FetchStatus) {
        let _ = (index, total, url, status);
    }

    /// Called once after every URL has been attempted.
    fn on_fetch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FetchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GalleryConfig`].
pub type ProgressCallback = Arc<dyn FetchProgressCallback>;
