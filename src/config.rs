//! Configuration types for board-to-PDF runs.
//!
//! All run behaviour is controlled through [`GalleryConfig`], built via its
//! [`GalleryConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config between the eager and streaming entry points, print it
//! with `--verbose`, and diff two runs to see why their grids differ.
//!
//! # Design choice: builder over constructor
//! Most callers only touch one or two knobs (row height, concurrency). The
//! builder lets them set just those and rely on documented defaults.

use crate::error::Board2PdfError;
use crate::progress::ProgressCallback;
use board2pdf_layout::{LastRowPolicy, LayoutConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default gallery-container marker. Everything before its first occurrence
/// (header, "more ideas" carousels) is ignored.
pub const DEFAULT_MARKER: &str = r#"class="Grid__Container""#;

/// Default image CDN origin.
pub const DEFAULT_CDN_PREFIX: &str = "https://i.pinimg.com";

/// Low-resolution tier the board page embeds.
pub const DEFAULT_PREVIEW_TIER: &str = "236x";

/// Maximum-resolution tier requested first.
pub const DEFAULT_ORIGINAL_TIER: &str = "originals";

/// Configuration for one board-to-PDF run.
///
/// Built via [`GalleryConfig::builder()`] or using [`GalleryConfig::default()`].
///
/// # Example
/// ```rust
/// use board2pdf::GalleryConfig;
///
/// let config = GalleryConfig::builder()
///     .target_row_height(300.0)
///     .concurrency(4)
///     .render_pdf(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.layout.target_row_height, 300.0);
/// ```
#[derive(Clone)]
pub struct GalleryConfig {
    /// Justified grid geometry. Default: 1080 px wide, 450 px rows, 10 px gaps.
    pub layout: LayoutConfig,

    /// Where to look for images in the board markup and how URLs are tiered.
    pub source: SourceConfig,

    /// Maximum in-flight image downloads. Default: 1 (strictly sequential).
    ///
    /// Outcomes are always consumed in board order, whatever this is set to.
    pub concurrency: usize,

    /// Per-request timeout for image downloads, in seconds. Default: 30.
    ///
    /// Applies separately to the primary and the fallback request.
    pub fetch_timeout_secs: u64,

    /// `User-Agent` header sent with image requests.
    pub user_agent: String,

    /// Print the composed grid to `<output dir name>.pdf`. Default: true.
    pub render_pdf: bool,

    /// Upper bound on any single browser operation, in seconds. Default: 60.
    pub render_timeout_secs: u64,

    /// Extra wait after the board page reports loaded, in milliseconds. Default: 1500.
    ///
    /// Boards fill their grid from XHR after the load event; this gives the
    /// grid time to appear before the DOM is serialised.
    pub settle_ms: u64,

    /// PDF page setup.
    pub pdf: PdfOptions,

    /// Write `gallery.json` next to `index.html`. Default: true.
    pub write_manifest: bool,

    /// Receives one event per processed URL.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            source: SourceConfig::default(),
            concurrency: 1,
            fetch_timeout_secs: 30,
            user_agent: concat!("board2pdf/", env!("CARGO_PKG_VERSION")).to_string(),
            render_pdf: true,
            render_timeout_secs: 60,
            settle_ms: 1500,
            pdf: PdfOptions::default(),
            write_manifest: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GalleryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GalleryConfig")
            .field("layout", &self.layout)
            .field("source", &self.source)
            .field("concurrency", &self.concurrency)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("render_pdf", &self.render_pdf)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("settle_ms", &self.settle_ms)
            .field("pdf", &self.pdf)
            .field("write_manifest", &self.write_manifest)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn FetchProgressCallback>"),
            )
            .finish()
    }
}

impl GalleryConfig {
    /// Create a new builder for `GalleryConfig`.
    pub fn builder() -> GalleryConfigBuilder {
        GalleryConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Gallery marker, CDN origin and resolution tiers.
///
/// Image URLs follow the grammar `{cdn_prefix}/{tier}/{rest}`; only the
/// `{tier}` segment differs between the preview and the original upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub marker: String,
    pub cdn_prefix: String,
    pub preview_tier: String,
    pub original_tier: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            cdn_prefix: DEFAULT_CDN_PREFIX.to_string(),
            preview_tier: DEFAULT_PREVIEW_TIER.to_string(),
            original_tier: DEFAULT_ORIGINAL_TIER.to_string(),
        }
    }
}

impl SourceConfig {
    fn validate(&self) -> Result<(), Board2PdfError> {
        if self.marker.is_empty() {
            return Err(Board2PdfError::InvalidConfig("marker must not be empty".into()));
        }
        if self.cdn_prefix.is_empty() {
            return Err(Board2PdfError::InvalidConfig("cdn_prefix must not be empty".into()));
        }
        for tier in [&self.preview_tier, &self.original_tier] {
            if tier.is_empty() || tier.contains('/') {
                return Err(Board2PdfError::InvalidConfig(format!(
                    "tier {tier:?} must be a single non-empty path segment"
                )));
            }
        }
        if self.preview_tier == self.original_tier {
            return Err(Board2PdfError::InvalidConfig(
                "preview_tier and original_tier must differ".into(),
            ));
        }
        Ok(())
    }
}

/// PDF page setup passed to the browser's print-to-PDF call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    /// Paper width in inches. Default: A4 (8.27).
    pub paper_width_in: f64,
    /// Paper height in inches. Default: A4 (11.69).
    pub paper_height_in: f64,
    /// Margin on all four sides, in centimetres. Default: 0.54.
    pub margin_cm: f64,
    /// Include CSS backgrounds. Default: true.
    pub print_background: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            paper_width_in: 8.27,
            paper_height_in: 11.69,
            margin_cm: 0.54,
            print_background: true,
        }
    }
}

impl PdfOptions {
    /// Margin converted to inches, the unit the print call expects.
    pub fn margin_in(&self) -> f64 {
        self.margin_cm / 2.54
    }
}

/// Builder for [`GalleryConfig`].
#[derive(Debug)]
pub struct GalleryConfigBuilder {
    config: GalleryConfig,
}

impl GalleryConfigBuilder {
    pub fn container_width(mut self, px: f64) -> Self {
        self.config.layout.container_width = px;
        self
    }

    pub fn target_row_height(mut self, px: f64) -> Self {
        self.config.layout.target_row_height = px;
        self
    }

    /// Sets both the gap between boxes and the gap between rows.
    pub fn spacing(mut self, px: f64) -> Self {
        self.config.layout.box_spacing = px;
        self.config.layout.row_spacing = px;
        self
    }

    pub fn box_spacing(mut self, px: f64) -> Self {
        self.config.layout.box_spacing = px;
        self
    }

    pub fn row_spacing(mut self, px: f64) -> Self {
        self.config.layout.row_spacing = px;
        self
    }

    pub fn last_row(mut self, policy: LastRowPolicy) -> Self {
        self.config.layout.last_row = policy;
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.config.source.marker = marker.into();
        self
    }

    pub fn cdn_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.source.cdn_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn preview_tier(mut self, tier: impl Into<String>) -> Self {
        self.config.source.preview_tier = tier.into();
        self
    }

    pub fn original_tier(mut self, tier: impl Into<String>) -> Self {
        self.config.source.original_tier = tier.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn render_pdf(mut self, v: bool) -> Self {
        self.config.render_pdf = v;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.config.settle_ms = ms;
        self
    }

    pub fn pdf(mut self, pdf: PdfOptions) -> Self {
        self.config.pdf = pdf;
        self
    }

    pub fn write_manifest(mut self, v: bool) -> Self {
        self.config.write_manifest = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GalleryConfig, Board2PdfError> {
        let c = &self.config;
        c.layout
            .validate()
            .map_err(|e| Board2PdfError::InvalidConfig(e.to_string()))?;
        c.source.validate()?;
        if c.concurrency == 0 {
            return Err(Board2PdfError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(Board2PdfError::InvalidConfig(
                "fetch_timeout_secs must be ≥ 1".into(),
            ));
        }
        let pdf = &c.pdf;
        if !(pdf.paper_width_in > 0.0 && pdf.paper_height_in > 0.0) {
            return Err(Board2PdfError::InvalidConfig(
                "PDF paper size must be positive".into(),
            ));
        }
        if !(pdf.margin_cm >= 0.0 && pdf.margin_in() * 2.0 < pdf.paper_width_in.min(pdf.paper_height_in)) {
            return Err(Board2PdfError::InvalidConfig(format!(
                "PDF margin {}cm does not fit the page",
                pdf.margin_cm
            )));
        }
        Ok(self.config)
    }
}
