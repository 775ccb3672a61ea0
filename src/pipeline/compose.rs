//! Gallery page composition: artifacts + layout → a static HTML document.
//!
//! The document is written next to the images and printed by the browser, so
//! every `<img>` uses a relative `src` and an inline style. Each layout row is
//! an in-flow `div.row` of the row's height that the printer never splits;
//! images are absolutely positioned inside their row. No scripts, no external
//! CSS: what Chrome prints is exactly what the layout engine computed.

use crate::error::Board2PdfError;
use crate::pipeline::artifact::ImageArtifact;
use board2pdf_layout::{LayoutBox, LayoutResult};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::collections::HashMap;
use tracing::debug;

const PAGE_CSS: &str = "\
html, body { margin: 0; padding: 0; background: #fff; }
.grid { margin: 0 auto; }
.grid .row { position: relative; page-break-inside: avoid; break-inside: avoid; }
.grid img { position: absolute; display: block; }
";

fn px(v: f64) -> String {
    format!("{v:.2}px")
}

/// Inline style for a box, with `top` relative to its row.
fn box_style(b: &LayoutBox, row_top: f64) -> String {
    format!(
        "top: {}; left: {}; width: {}; height: {};",
        px(b.top - row_top),
        px(b.left),
        px(b.width),
        px(b.height)
    )
}

/// One printed row: its boxes plus the vertical geometry of the wrapper.
struct Row<'a> {
    top: f64,
    height: f64,
    gap_below: f64,
    placed: &'a [(&'a LayoutBox, &'a ImageArtifact)],
}

impl Row<'_> {
    fn style(&self) -> String {
        format!("height: {}; margin-bottom: {};", px(self.height), px(self.gap_below))
    }
}

/// Group placed boxes into rows. Boxes arrive in layout order, so each row
/// is a contiguous run.
fn rows<'a>(placed: &'a [(&'a LayoutBox, &'a ImageArtifact)]) -> Vec<Row<'a>> {
    let mut rows: Vec<Row<'a>> = placed
        .chunk_by(|(a, _), (b, _)| a.row == b.row)
        .map(|run| {
            let top = run.iter().map(|(b, _)| b.top).fold(f64::INFINITY, f64::min);
            let bottom = run.iter().map(|(b, _)| b.bottom()).fold(top, f64::max);
            Row {
                top,
                height: bottom - top,
                gap_below: 0.0,
                placed: run,
            }
        })
        .collect();

    for i in 1..rows.len() {
        let gap = rows[i].top - (rows[i - 1].top + rows[i - 1].height);
        rows[i - 1].gap_below = gap.max(0.0);
    }
    rows
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

/// Render the gallery page.
///
/// Each box is joined to its artifact by `box.key == artifact.source_order`.
///
/// # Errors
/// [`Board2PdfError::AlignmentMismatch`] when a box key has no artifact, or
/// when two artifacts claim the same key.
pub fn compose_page(
    title: &str,
    artifacts: &[ImageArtifact],
    layout: &LayoutResult,
    container_width: f64,
) -> Result<String, Board2PdfError> {
    let mut by_key: HashMap<usize, &ImageArtifact> = HashMap::with_capacity(artifacts.len());
    for artifact in artifacts {
        if by_key.insert(artifact.source_order, artifact).is_some() {
            return Err(Board2PdfError::AlignmentMismatch {
                key: artifact.source_order,
            });
        }
    }

    let placed = layout
        .boxes
        .iter()
        .map(|b| {
            by_key
                .get(&b.key)
                .map(|artifact| (b, *artifact))
                .ok_or(Board2PdfError::AlignmentMismatch { key: b.key })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let grid_style = format!(
        "width: {}; height: {};",
        px(container_width),
        px(layout.container_height)
    );

    let rows = rows(&placed);

    let content = html! {
        div.grid style=(grid_style) {
            @for row in &rows {
                div.row style=(row.style()) {
                    @for (b, artifact) in row.placed {
                        img src=(artifact.file_name)
                            style=(box_style(b, row.top))
                            data-source=(artifact.source_url)
                            alt="";
                    }
                }
            }
        }
    };

    let page = base_document(title, content).into_string();
    debug!(
        "Composed page with {} images in {} rows ({} bytes)",
        placed.len(),
        rows.len(),
        page.len()
    );
    Ok(page)
}
