//! Streaming fetch API: emit one event per candidate URL, in board order.
//!
//! ## Why stream?
//!
//! A large board has hundreds of pins and each original can be several
//! megabytes. A stream lets callers write each image to disk (or show it)
//! as soon as it is measured instead of holding the whole board in memory.
//!
//! Unlike [`crate::gallery::build_gallery`], which returns only after the PDF
//! is printed, [`fetch_artifacts_stream`] does no I/O besides HTTP and yields
//! [`ArtifactEvent`]s as fetches complete. With `concurrency > 1` up to that
//! many fetches overlap, but events are still yielded in candidate order.

use crate::config::GalleryConfig;
use crate::error::{Board2PdfError, ImageError};
use crate::pipeline::artifact::{build_artifact, ImageArtifact};
use crate::pipeline::extract::UrlExtractor;
use crate::pipeline::fetch::{fetch_image, FetchOutcome, HttpSource};
use crate::progress::FetchStatus;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A measured image together with the bytes it was measured from.
#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub artifact: ImageArtifact,
    pub bytes: Vec<u8>,
}

/// The fully processed result for one candidate URL.
#[derive(Debug, Clone)]
pub struct ArtifactEvent {
    /// Position in the deduplicated candidate list.
    pub index: usize,
    /// Full-resolution candidate URL.
    pub url: String,
    /// [`FetchStatus::Failed`] whenever `result` is `Err`.
    pub status: FetchStatus,
    pub result: Result<FetchedArtifact, ImageError>,
}

/// A boxed stream of per-URL events.
pub type ArtifactStream<'a> = Pin<Box<dyn Stream<Item = ArtifactEvent> + Send + 'a>>;

/// Fetch and measure every URL in `urls`.
///
/// Yields exactly one event per URL, in the order given. Per-image failures
/// are events, never stream termination.
pub fn fetch_artifacts_stream<'a, S: HttpSource>(
    source: &'a S,
    urls: Vec<String>,
    config: &'a GalleryConfig,
) -> ArtifactStream<'a> {
    let tiers = &config.source;

    let s = stream::iter(urls.into_iter().enumerate())
        .map(move |(index, url)| async move {
            let outcome = fetch_image(source, &url, tiers).await;
            into_event(index, outcome)
        })
        .buffered(config.concurrency.max(1));

    Box::pin(s)
}

/// Extract candidate URLs from `markup` and stream their artifacts.
///
/// # Errors
/// Fails up front, before any request, if the gallery marker is missing.
pub fn stream_from_markup<'a, S: HttpSource>(
    source: &'a S,
    markup: &str,
    config: &'a GalleryConfig,
) -> Result<ArtifactStream<'a>, Board2PdfError> {
    let urls = UrlExtractor::new(&config.source)?.extract(markup)?;
    info!("Streaming {} candidate images", urls.len());
    Ok(fetch_artifacts_stream(source, urls, config))
}

fn into_event(index: usize, outcome: FetchOutcome) -> ArtifactEvent {
    let url = outcome.url().to_string();
    let fetch_status = outcome.status();

    let result = outcome.into_bytes().and_then(|bytes| {
        let mut artifact = build_artifact(&url, &bytes, index)?;
        artifact.fell_back = fetch_status == FetchStatus::FellBack;
        Ok(FetchedArtifact { artifact, bytes })
    });

    let status = if result.is_ok() {
        fetch_status
    } else {
        FetchStatus::Failed
    };

    ArtifactEvent {
        index,
        url,
        status,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fetch::HttpError;
    use crate::test_helpers::{png_bytes, MockSource};

    fn original(n: usize) -> String {
        format!("https://i.pinimg.com/originals/aa/{n}.png")
    }

    fn preview(n: usize) -> String {
        format!("https://i.pinimg.com/236x/aa/{n}.png")
    }

    fn board_source() -> MockSource {
        MockSource::new()
            .with(&original(0), Ok(png_bytes(30, 20)))
            .with(&original(1), Err(HttpError::Status(403)))
            .with(&preview(1), Ok(png_bytes(10, 10)))
            .with(&original(2), Err(HttpError::Status(404)))
            .with(&preview(2), Err(HttpError::Status(404)))
            .with(&original(3), Ok(b"not an image".to_vec()))
    }

    fn collect(source: &MockSource, config: &GalleryConfig) -> Vec<ArtifactEvent> {
        let urls = (0..4).map(original).collect();
        tokio_test::block_on(fetch_artifacts_stream(source, urls, config).collect())
    }

    #[test]
    fn one_event_per_url_with_symbols() {
        let source = board_source();
        let events = collect(&source, &GalleryConfig::default());

        let trail: String = events.iter().map(|e| e.status.symbol()).collect();
        assert_eq!(trail, ".!xx");
        assert_eq!(
            events.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn fallback_artifact_is_marked() {
        let source = board_source();
        let events = collect(&source, &GalleryConfig::default());

        let fetched = events[1].result.as_ref().unwrap();
        assert!(fetched.artifact.fell_back);
        assert_eq!(fetched.artifact.source_url, original(1));
        assert_eq!(fetched.artifact.source_order, 1);
        assert_eq!((fetched.artifact.width, fetched.artifact.height), (10, 10));
    }

    #[test]
    fn undecodable_bytes_fail_after_successful_fetch() {
        let source = board_source();
        let events = collect(&source, &GalleryConfig::default());
        assert!(matches!(
            events[3].result,
            Err(ImageError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn concurrent_window_keeps_board_order() {
        let source = board_source();
        let config = GalleryConfig::builder().concurrency(4).build().unwrap();
        let events = collect(&source, &config);

        let trail: String = events.iter().map(|e| e.status.symbol()).collect();
        assert_eq!(trail, ".!xx");
        assert_eq!(events[0].url, original(0));
        assert_eq!(events[3].url, original(3));
    }

    #[test]
    fn sequential_mode_requests_in_order() {
        let source = board_source();
        collect(&source, &GalleryConfig::default());
        assert_eq!(
            source.requests(),
            vec![
                original(0),
                original(1),
                preview(1),
                original(2),
                preview(2),
                original(3)
            ]
        );
    }

    #[test]
    fn markup_without_marker_fails_before_fetching() {
        let source = MockSource::new();
        let config = GalleryConfig::default();
        let err = stream_from_markup(&source, "<html></html>", &config).err().unwrap();
        assert!(matches!(err, Board2PdfError::MarkerNotFound { .. }));
        assert!(source.requests().is_empty());
    }
}
