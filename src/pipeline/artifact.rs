//! Image artifacts: fetched bytes → file name + pixel dimensions.
//!
//! Building an artifact is pure. The orchestrator decides where the bytes go;
//! this module only answers "what is this file called" and "how big is it".
//! Dimensions are read from the image header, never from a full decode, so a
//! 40 MB original costs a few hundred bytes of parsing.

use crate::error::ImageError;
use image::ImageReader;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Cursor;
use tracing::debug;

/// One successfully fetched and measured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// Local file name inside the output directory. Unique within a run.
    pub file_name: String,
    /// Full-resolution candidate URL (even when the preview tier was served).
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    /// Index of `source_url` in the deduplicated candidate list.
    pub source_order: usize,
    /// The bytes came from the preview-tier fallback.
    pub fell_back: bool,
}

static LAST_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^/]+$").unwrap());

/// Final path segment of `url`, ignoring any query string or fragment.
pub fn derive_file_name(url: &str) -> Result<String, ImageError> {
    let path = url.split(['?', '#']).next().unwrap_or_default();

    match LAST_SEGMENT.find(path).map(|m| m.as_str()) {
        Some(name) if name != "." && name != ".." => Ok(name.to_string()),
        _ => Err(ImageError::InvalidFileName {
            url: url.to_string(),
        }),
    }
}

/// Read width and height from an encoded image buffer.
fn read_dimensions(url: &str, bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::UnreadableImage {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    if reader.format().is_none() {
        return Err(ImageError::UnsupportedFormat {
            url: url.to_string(),
        });
    }

    // A recognised header whose codec is not compiled in.
    let (width, height) = reader.into_dimensions().map_err(|e| match e {
        image::ImageError::Unsupported(_) => ImageError::UnsupportedFormat {
            url: url.to_string(),
        },
        e => ImageError::UnreadableImage {
            url: url.to_string(),
            detail: e.to_string(),
        },
    })?;

    if width == 0 || height == 0 {
        return Err(ImageError::UnreadableImage {
            url: url.to_string(),
            detail: format!("zero-sized image ({width}x{height})"),
        });
    }

    Ok((width, height))
}

/// Build the artifact for `url` from its fetched `bytes`.
///
/// `fell_back` starts out `false`; the orchestrator sets it from the fetch
/// outcome. The file name is the URL-derived one and has not yet been checked
/// for collisions, see [`FileNamer`].
pub fn build_artifact(url: &str, bytes: &[u8], source_order: usize) -> Result<ImageArtifact, ImageError> {
    let file_name = derive_file_name(url)?;
    let (width, height) = read_dimensions(url, bytes)?;

    debug!("{} → {} ({}x{})", url, file_name, width, height);

    Ok(ImageArtifact {
        file_name,
        source_url: url.to_string(),
        width,
        height,
        source_order,
        fell_back: false,
    })
}

/// Hands out unique file names for one output directory.
///
/// The first URL to claim a name gets it unchanged. A later URL deriving the
/// same name gets `-{8 hex digits of SHA-256(url)}` before its extension.
#[derive(Debug, Default)]
pub struct FileNamer {
    used: HashSet<String>,
}

impl FileNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namer that never hands out any of `names`, e.g. the run's own
    /// `index.html`. An image deriving one of them is suffixed like any
    /// other collision.
    pub fn with_reserved<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            used: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Reserve a unique name for `url`, starting from `name`.
    pub fn claim(&mut self, name: &str, url: &str) -> String {
        if self.used.insert(name.to_string()) {
            return name.to_string();
        }

        let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
        let suffix = &digest[..8];
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };

        let mut attempt = 0usize;
        loop {
            let tag = if attempt == 0 {
                suffix.to_string()
            } else {
                format!("{suffix}-{attempt}")
            };
            let candidate = match ext {
                Some(ext) => format!("{stem}-{tag}.{ext}"),
                None => format!("{stem}-{tag}"),
            };
            if self.used.insert(candidate.clone()) {
                debug!("File name {} already taken; using {}", name, candidate);
                return candidate;
            }
            attempt += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
