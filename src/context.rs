//! Per-run mutable state.
//!
//! One [`RunContext`] is created per run and owned by the single consumer of
//! the fetch stream. It is the only place artifacts, failures and file names
//! accumulate, so no locks are involved even when fetches overlap.

use crate::error::ImageError;
use crate::output::ErrorLog;
use crate::pipeline::artifact::{FileNamer, ImageArtifact};
use crate::progress::FetchStatus;
use crate::stream::{ArtifactEvent, FetchedArtifact};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Default)]
pub struct RunContext {
    artifacts: Vec<ImageArtifact>,
    errors: ErrorLog,
    namer: FileNamer,
    fell_back: usize,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose images can never take one of `names`.
    pub fn with_reserved_names<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            namer: FileNamer::with_reserved(names),
            ..Self::default()
        }
    }

    /// Persist a fetched image into `dir` and record the event.
    ///
    /// Returns the final status: a write failure turns a successful fetch
    /// into [`FetchStatus::Failed`].
    pub async fn record(&mut self, event: ArtifactEvent, dir: &Path) -> FetchStatus {
        let ArtifactEvent {
            index,
            status,
            result,
            ..
        } = event;

        let FetchedArtifact { mut artifact, bytes } = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                self.fail(index, e);
                return FetchStatus::Failed;
            }
        };

        artifact.file_name = self.namer.claim(&artifact.file_name, &artifact.source_url);
        let path = dir.join(&artifact.file_name);

        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            self.fail(
                index,
                ImageError::WriteFailed {
                    url: artifact.source_url,
                    detail: format!("{}: {}", path.display(), e),
                },
            );
            return FetchStatus::Failed;
        }

        if artifact.fell_back {
            self.fell_back += 1;
        }
        self.artifacts.push(artifact);
        status
    }

    fn fail(&mut self, index: usize, error: ImageError) {
        warn!("{}", error);
        self.errors.push(index, error);
    }

    pub fn artifacts(&self) -> &[ImageArtifact] {
        &self.artifacts
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn fell_back(&self) -> usize {
        self.fell_back
    }

    pub fn into_parts(self) -> (Vec<ImageArtifact>, ErrorLog) {
        (self.artifacts, self.errors)
    }
}
