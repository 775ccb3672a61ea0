//! URL extraction: board markup → deduplicated full-resolution image URLs.
//!
//! A rendered board page references every pin through a preview-sized CDN
//! URL (`https://i.pinimg.com/236x/ab/cd/ef/abcdef.jpg`). We cut the markup at
//! the gallery container marker so headers and recommendation carousels above
//! it are ignored, collect every preview URL after it, drop repeats (the same
//! pin appears in `src` and `srcset`), and rewrite each to the `originals`
//! tier.
//!
//! ## URL grammar
//!
//! ```text
//! {cdn_prefix}/{tier}/{rest}
//! https://i.pinimg.com/236x/ab/cd/ef/abcdef.jpg
//! https://i.pinimg.com/originals/ab/cd/ef/abcdef.jpg
//! ```
//!
//! Only the first `/{tier}/` segment is rewritten. [`rewrite_tier`] fails
//! with a typed error when the segment is absent instead of returning the URL
//! unchanged, so a URL that cannot be tiered never masquerades as one that was.

use crate::config::SourceConfig;
use crate::error::Board2PdfError;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Failure to rewrite a URL between resolution tiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    /// The URL has no `/{tier}/` path segment.
    #[error("URL {url:?} has no /{tier}/ segment")]
    SegmentMissing { url: String, tier: String },
}

/// Replace the first `/{from}/` segment of `url` with `/{to}/`.
///
/// # Errors
/// [`TierError::SegmentMissing`] when `url` contains no `/{from}/` segment.
pub fn rewrite_tier(url: &str, from: &str, to: &str) -> Result<String, TierError> {
    let needle = format!("/{from}/");
    if !url.contains(&needle) {
        return Err(TierError::SegmentMissing {
            url: url.to_string(),
            tier: from.to_string(),
        });
    }
    Ok(url.replacen(&needle, &format!("/{to}/"), 1))
}

/// Compiled extractor for one [`SourceConfig`].
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    marker: String,
    pattern: Regex,
    preview_tier: String,
    original_tier: String,
}

impl UrlExtractor {
    /// Compile the preview-URL pattern for `source`.
    pub fn new(source: &SourceConfig) -> Result<Self, Board2PdfError> {
        let pattern = format!(
            r#"{}/{}/[^"'\s<>]+"#,
            regex::escape(&source.cdn_prefix),
            regex::escape(&source.preview_tier)
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| Board2PdfError::InvalidConfig(format!("URL pattern: {e}")))?;

        Ok(Self {
            marker: source.marker.clone(),
            pattern,
            preview_tier: source.preview_tier.clone(),
            original_tier: source.original_tier.clone(),
        })
    }

    /// Extract full-resolution candidate URLs from `markup`, in first-seen order.
    ///
    /// # Errors
    /// [`Board2PdfError::MarkerNotFound`] when the gallery marker is absent.
    pub fn extract(&self, markup: &str) -> Result<Vec<String>, Board2PdfError> {
        let (_, gallery) =
            markup
                .split_once(&self.marker)
                .ok_or_else(|| Board2PdfError::MarkerNotFound {
                    marker: self.marker.clone(),
                })?;

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut matches = 0usize;

        for m in self.pattern.find_iter(gallery) {
            matches += 1;
            // The pattern guarantees the preview segment is present.
            let upgraded = rewrite_tier(m.as_str(), &self.preview_tier, &self.original_tier)
                .map_err(|e| Board2PdfError::Internal(e.to_string()))?;
            if seen.insert(upgraded.clone()) {
                urls.push(upgraded);
            }
        }

        debug!(
            "Extracted {} unique image URLs from {} matches",
            urls.len(),
            matches
        );
        Ok(urls)
    }
}

/// One-shot helper: compile an extractor for `source` and run it on `markup`.
pub fn extract_urls(markup: &str, source: &SourceConfig) -> Result<Vec<String>, Board2PdfError> {
    UrlExtractor::new(source)?.extract(markup)
}
