//! # board2pdf-layout
//!
//! Justified (Flickr-style) row layout. Given images of arbitrary aspect
//! ratio, pack them in order into rows that exactly span a fixed container
//! width while staying close to a target row height.
//!
//! ## How it works
//!
//! 1. Each item's *natural width* is its width when scaled to the target row
//!    height: `target_row_height * (width / height)`.
//! 2. Items are appended to the current row while the row's natural width
//!    (items plus `box_spacing` between them) still fits the container.
//! 3. When the next item would overflow, the row is closed and rescaled so it
//!    spans the container exactly. Every box keeps its own aspect ratio; only
//!    the shared row height changes.
//! 4. `container_height` is the sum of row heights plus `row_spacing` between
//!    rows.
//!
//! ```text
//!  container_width
//! ├──────────────────────────────────────────┤
//! ┌───────────┐ ┌────┐ ┌────────┐ ┌─────────┐  ← row 0 (scaled to fill)
//! └───────────┘ └────┘ └────────┘ └─────────┘
//!                                               ← row_spacing
//! ┌──────────────┐ ┌─────────────────────────┐  ← row 1
//! └──────────────┘ └─────────────────────────┘
//! ```
//!
//! ## Last row
//!
//! [`LastRowPolicy::Justify`] (default) scales the final row to fill the
//! container like any other row. [`LastRowPolicy::KeepTargetHeight`] leaves it
//! at the target height, left aligned, shrinking it only when it would not fit.
//!
//! ## Usage
//!
//! ```rust
//! use board2pdf_layout::{layout, LayoutConfig, LayoutItem};
//!
//! let items = vec![
//!     LayoutItem::new(0, 1200.0, 800.0),
//!     LayoutItem::new(1, 800.0, 1200.0),
//! ];
//! let result = layout(&items, &LayoutConfig::default()).unwrap();
//! assert_eq!(result.boxes.len(), 2);
//! assert_eq!(result.rows, 1);
//! ```
//!
//! The function is pure: identical inputs always produce identical output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Default container width in CSS pixels.
pub const DEFAULT_CONTAINER_WIDTH: f64 = 1080.0;

/// Default target row height in CSS pixels.
pub const DEFAULT_TARGET_ROW_HEIGHT: f64 = 450.0;

/// Default horizontal gap between boxes in a row.
pub const DEFAULT_BOX_SPACING: f64 = 10.0;

/// Default vertical gap between rows.
pub const DEFAULT_ROW_SPACING: f64 = 10.0;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by [`layout`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A configuration value is out of range.
    #[error("Invalid layout configuration: {0}")]
    InvalidConfig(String),

    /// An item has a zero, negative or non-finite dimension.
    #[error("Layout item {key} has invalid dimensions {width}x{height}")]
    InvalidItem { key: usize, width: f64, height: f64 },
}

// ── Input types ──────────────────────────────────────────────────────────────

/// One rectangle to place. `key` is copied verbatim to the matching
/// [`LayoutBox`] so callers can join results back to their own records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub key: usize,
    pub width: f64,
    pub height: f64,
}

impl LayoutItem {
    pub fn new(key: usize, width: f64, height: f64) -> Self {
        Self { key, width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(LayoutError::InvalidItem {
                key: self.key,
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// How the final row is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastRowPolicy {
    /// Scale the last row to fill the container width (default).
    #[default]
    Justify,
    /// Keep the last row at the target height, left aligned.
    KeepTargetHeight,
}

/// Layout parameters. All lengths are in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub container_width: f64,
    pub target_row_height: f64,
    /// Horizontal gap between neighbouring boxes in a row.
    pub box_spacing: f64,
    /// Vertical gap between rows.
    pub row_spacing: f64,
    pub last_row: LastRowPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_width: DEFAULT_CONTAINER_WIDTH,
            target_row_height: DEFAULT_TARGET_ROW_HEIGHT,
            box_spacing: DEFAULT_BOX_SPACING,
            row_spacing: DEFAULT_ROW_SPACING,
            last_row: LastRowPolicy::default(),
        }
    }
}

impl LayoutConfig {
    /// Check every parameter is finite and in range.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !(self.container_width.is_finite() && self.container_width > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "container_width must be > 0, got {}",
                self.container_width
            )));
        }
        if !(self.target_row_height.is_finite() && self.target_row_height > 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "target_row_height must be > 0, got {}",
                self.target_row_height
            )));
        }
        if !(self.box_spacing.is_finite() && self.box_spacing >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "box_spacing must be >= 0, got {}",
                self.box_spacing
            )));
        }
        if !(self.row_spacing.is_finite() && self.row_spacing >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "row_spacing must be >= 0, got {}",
                self.row_spacing
            )));
        }
        Ok(())
    }
}

// ── Output types ─────────────────────────────────────────────────────────────

/// Placed geometry for one [`LayoutItem`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Key of the item this box was produced for.
    pub key: usize,
    /// 0-based row index.
    pub row: usize,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Result of a layout run: one box per input item, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub boxes: Vec<LayoutBox>,
    /// Number of rows produced.
    pub rows: usize,
    /// Height enclosing every row, including the spacing between rows.
    pub container_height: f64,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Boxes belonging to `row`, left to right.
    pub fn row_boxes(&self, row: usize) -> impl Iterator<Item = &LayoutBox> {
        self.boxes.iter().filter(move |b| b.row == row)
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// How a closed row is scaled.
#[derive(Clone, Copy)]
enum RowFit {
    Justify,
    Natural,
}

/// Pack `items` into justified rows.
///
/// An empty slice yields an empty result with zero height; that is a valid
/// degenerate layout, not an error.
///
/// # Errors
/// [`LayoutError::InvalidConfig`] for out-of-range parameters and
/// [`LayoutError::InvalidItem`] for items with unusable dimensions.
pub fn layout(items: &[LayoutItem], config: &LayoutConfig) -> Result<LayoutResult, LayoutError> {
    config.validate()?;
    for item in items {
        item.validate()?;
    }

    let mut boxes = Vec::with_capacity(items.len());
    let mut rows = 0usize;
    let mut bottom = 0.0f64;

    let mut start = 0usize;
    let mut natural_width = 0.0f64;

    for (i, item) in items.iter().enumerate() {
        let width = config.target_row_height * item.aspect_ratio();
        if i == start {
            natural_width = width;
            continue;
        }
        let candidate = natural_width + config.box_spacing + width;
        if candidate > config.container_width {
            bottom = close_row(&items[start..i], rows, bottom, RowFit::Justify, config, &mut boxes);
            rows += 1;
            start = i;
            natural_width = width;
        } else {
            natural_width = candidate;
        }
    }

    if start < items.len() {
        let fit = match config.last_row {
            LastRowPolicy::Justify => RowFit::Justify,
            LastRowPolicy::KeepTargetHeight => RowFit::Natural,
        };
        bottom = close_row(&items[start..], rows, bottom, fit, config, &mut boxes);
        rows += 1;
    }

    Ok(LayoutResult {
        boxes,
        rows,
        container_height: bottom,
    })
}

/// Scale one row, push its boxes and return the new bottom edge.
fn close_row(
    row: &[LayoutItem],
    row_index: usize,
    previous_bottom: f64,
    fit: RowFit,
    config: &LayoutConfig,
    boxes: &mut Vec<LayoutBox>,
) -> f64 {
    let top = if row_index == 0 {
        0.0
    } else {
        previous_bottom + config.row_spacing
    };

    let gaps = config.box_spacing * (row.len() - 1) as f64;
    let ratio_sum: f64 = row.iter().map(LayoutItem::aspect_ratio).sum();
    let justified = (config.container_width - gaps) / ratio_sum;
    let height = match fit {
        RowFit::Justify => justified,
        RowFit::Natural => config.target_row_height.min(justified),
    };

    let mut left = 0.0;
    for item in row {
        let width = height * item.aspect_ratio();
        boxes.push(LayoutBox {
            key: item.key,
            row: row_index,
            top,
            left,
            width,
            height,
        });
        left += width + config.box_spacing;
    }

    top + height
}
