//! Input resolution: a board URL or a saved page → markup + page title.
//!
//! ## Why accept saved pages?
//!
//! Rendering a live board needs Chrome and a network round trip, and the
//! result changes as pins are added. A page saved from the browser (or the
//! `raw.html` of an earlier run) is a stable input: re-running it skips the
//! browser entirely and reproduces the same grid.

use crate::error::Board2PdfError;
use crate::pipeline::render::PageRenderer;
use std::path::PathBuf;
use tracing::{debug, info};

/// Markup ready for extraction, plus where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedMarkup {
    /// Used as the composed page's `<title>`: the board URL, or the file path.
    pub title: String,
    pub markup: String,
    pub origin: MarkupOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupOrigin {
    /// Serialised from a live page by the renderer.
    Rendered { url: String },
    /// Read from a saved page on disk.
    Saved { path: PathBuf },
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to board markup.
///
/// HTTP(S) URLs are rendered through `renderer`; anything else is treated as
/// a path to a saved page.
pub async fn resolve_markup<R: PageRenderer>(
    input: &str,
    renderer: &R,
) -> Result<ResolvedMarkup, Board2PdfError> {
    let input = input.trim();

    if is_url(input) {
        let markup = renderer.render_markup(input).await?;
        info!("Rendered {} bytes of markup from {}", markup.len(), input);
        return Ok(ResolvedMarkup {
            title: input.to_string(),
            markup,
            origin: MarkupOrigin::Rendered {
                url: input.to_string(),
            },
        });
    }

    if input.is_empty() || input.contains("://") {
        return Err(Board2PdfError::InvalidInput {
            input: input.to_string(),
        });
    }

    read_saved(input).await
}

async fn read_saved(path_str: &str) -> Result<ResolvedMarkup, Board2PdfError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(Board2PdfError::FileNotFound { path });
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| Board2PdfError::FileNotFound { path: path.clone() })?;
    let markup = String::from_utf8_lossy(&bytes).into_owned();

    debug!("Read {} bytes of saved markup from {}", markup.len(), path.display());

    Ok(ResolvedMarkup {
        title: path.display().to_string(),
        markup,
        origin: MarkupOrigin::Saved { path },
    })
}
