//! Resilient image fetching: one request, one fallback, no retries.
//!
//! Every candidate URL points at the `originals` tier. Some pins have no
//! original upload (or the CDN refuses it), so when the first request fails we
//! rewrite the URL back to the preview tier and ask exactly once more. A board
//! with a few dead pins still produces a PDF; the dead pins are reported at the
//! end instead.
//!
//! ## Why a trait?
//!
//! [`HttpSource`] is the only network seam in the fetch stage. Production uses
//! [`ReqwestSource`]; tests plug in an in-memory map so fallback and failure
//! paths are exercised without a server.

use crate::config::{GalleryConfig, SourceConfig};
use crate::error::{Board2PdfError, ImageError};
use crate::pipeline::extract::{rewrite_tier, TierError};
use crate::progress::FetchStatus;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// A failed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),
    /// The request exceeded the configured timeout.
    #[error("timed out")]
    Timeout,
    /// Connection, TLS or body-read failure.
    #[error("{0}")]
    Transport(String),
}

/// Something that can GET a URL and return the body bytes.
pub trait HttpSource: Send + Sync {
    /// Fetch `url`. Any non-2xx status must be reported as [`HttpError::Status`].
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// [`HttpSource`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &GalleryConfig) -> Result<Self, Board2PdfError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Board2PdfError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (custom proxies, headers, …).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpSource for ReqwestSource {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(classify)?;
        Ok(bytes.to_vec())
    }
}

fn classify(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Transport(e.to_string())
    }
}

/// Why the fallback attempt produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackFailure {
    /// The fallback request itself failed.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The URL has no `originals` segment, so no fallback URL exists.
    #[error("no tier segment: {0}")]
    NoTier(#[from] TierError),
}

/// Result of fetching one candidate URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The full-resolution URL answered.
    Success { url: String, bytes: Vec<u8> },
    /// The full-resolution URL failed; the preview-tier URL answered.
    FallbackSuccess {
        url: String,
        fallback_url: String,
        bytes: Vec<u8>,
    },
    /// Both attempts failed.
    Failure {
        url: String,
        primary: HttpError,
        fallback: FallbackFailure,
    },
}

impl FetchOutcome {
    /// The candidate (full-resolution) URL this outcome belongs to.
    pub fn url(&self) -> &str {
        match self {
            FetchOutcome::Success { url, .. }
            | FetchOutcome::FallbackSuccess { url, .. }
            | FetchOutcome::Failure { url, .. } => url,
        }
    }

    pub fn status(&self) -> FetchStatus {
        match self {
            FetchOutcome::Success { .. } => FetchStatus::Fetched,
            FetchOutcome::FallbackSuccess { .. } => FetchStatus::FellBack,
            FetchOutcome::Failure { .. } => FetchStatus::Failed,
        }
    }

    /// Body bytes for either success variant; a failure becomes
    /// [`ImageError::FetchFailed`].
    pub fn into_bytes(self) -> Result<Vec<u8>, ImageError> {
        match self {
            FetchOutcome::Success { bytes, .. } | FetchOutcome::FallbackSuccess { bytes, .. } => {
                Ok(bytes)
            }
            FetchOutcome::Failure {
                url,
                primary,
                fallback,
            } => Err(ImageError::FetchFailed {
                url,
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }
}

/// Fetch `url`, falling back once to the preview tier.
///
/// Never returns an error: a double failure is a [`FetchOutcome::Failure`]
/// so the caller can log it and move on to the next URL.
pub async fn fetch_image<S: HttpSource>(source: &S, url: &str, tiers: &SourceConfig) -> FetchOutcome {
    let primary = match source.get(url).await {
        Ok(bytes) => {
            debug!("Fetched {} ({} bytes)", url, bytes.len());
            return FetchOutcome::Success {
                url: url.to_string(),
                bytes,
            };
        }
        Err(e) => e,
    };

    let fallback_url = match rewrite_tier(url, &tiers.original_tier, &tiers.preview_tier) {
        Ok(u) => u,
        Err(e) => {
            warn!("{}: {}; no fallback possible", url, primary);
            return FetchOutcome::Failure {
                url: url.to_string(),
                primary,
                fallback: e.into(),
            };
        }
    };

    warn!("{}: {}; falling back to {}", url, primary, fallback_url);

    match source.get(&fallback_url).await {
        Ok(bytes) => {
            debug!("Fetched fallback {} ({} bytes)", fallback_url, bytes.len());
            FetchOutcome::FallbackSuccess {
                url: url.to_string(),
                fallback_url,
                bytes,
            }
        }
        Err(e) => {
            warn!("{}: fallback failed: {}", fallback_url, e);
            FetchOutcome::Failure {
                url: url.to_string(),
                primary,
                fallback: e.into(),
            }
        }
    }
}
