//! CLI binary for board2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GalleryConfig` and prints results.

use anyhow::{Context, Result};
use board2pdf::{
    build_gallery, summarize, FetchProgressCallback, FetchStatus, GalleryConfig, GalleryOutput,
    LastRowPolicy, ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Longest symbol trail shown in the bar message.
const TRAIL_WIDTH: usize = 48;

// ── Progress: indicatif bar ──────────────────────────────────────────────────

/// Progress bar whose message is the trail of `.`/`!`/`x` symbols.
struct BarProgress {
    bar: ProgressBar,
    trail: Mutex<String>,
}

impl BarProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading board…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            trail: Mutex::new(String::new()),
        })
    }
}

impl FetchProgressCallback for BarProgress {
    fn on_fetch_start(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:32.green/238}] {pos:>4}/{len} images  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Fetching");
        self.bar.set_message("");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total} images"))
        ));
    }

    fn on_image_done(&self, _index: usize, _total: usize, _url: &str, status: FetchStatus) {
        let mut trail = self.trail.lock().unwrap_or_else(|e| e.into_inner());
        trail.push(status.symbol());
        let start = trail.len().saturating_sub(TRAIL_WIDTH);
        self.bar.set_message(trail[start..].to_string());
        self.bar.inc(1);
    }

    fn on_fetch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!("{} {} images fetched", green("✔"), bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} images fetched  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

// ── Progress: raw symbols ────────────────────────────────────────────────────

/// One unbuffered symbol per image on stderr, for logs and dumb terminals.
struct SymbolProgress;

impl FetchProgressCallback for SymbolProgress {
    fn on_image_done(&self, _index: usize, _total: usize, _url: &str, status: FetchStatus) {
        let mut err = io::stderr().lock();
        let _ = write!(err, "{}", status.symbol());
        let _ = err.flush();
    }

    fn on_fetch_complete(&self, _total: usize, _success_count: usize) {
        eprintln!();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Export a live board (needs Chrome/Chromium installed)
  board2pdf --url https://www.pinterest.com/someone/cats/ --output out/cats

  # Re-run from a saved page, no browser for the board itself
  board2pdf --url out/cats/raw.html --output out/cats-again

  # Smaller rows, four downloads at a time, no PDF
  board2pdf -u https://www.pinterest.com/someone/cats/ -o out/cats \
      --row-height 300 --concurrency 4 --no-pdf

  # Machine-readable result
  board2pdf -u ... -o out/cats --json > cats.json

PROGRESS SYMBOLS:
  .   original fetched
  !   original failed, preview used instead
  x   image skipped (listed at the end)

OUTPUT DIRECTORY:
  raw.html        board markup as rendered
  <image files>   one per pin, named after the URL
  index.html      justified grid
  gallery.json    manifest (artifacts, layout, errors, stats)
  <dir>.pdf       A4 print of index.html

ENVIRONMENT VARIABLES:
  Every flag can be set as BOARD2PDF_<FLAG>, e.g. BOARD2PDF_CONCURRENCY=4.
  RUST_LOG overrides the log filter.
"#;

/// Export an image board as full-resolution images, a justified grid and a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "board2pdf",
    version,
    about = "Export an image board as full-resolution images, a justified grid and a PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Board URL, or path to a saved board page.
    #[arg(short, long, env = "BOARD2PDF_URL")]
    url: Option<String>,

    /// Output directory (created if missing).
    #[arg(short, long, env = "BOARD2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Grid width in CSS pixels.
    #[arg(long, env = "BOARD2PDF_CONTAINER_WIDTH", default_value_t = 1080.0)]
    container_width: f64,

    /// Target row height in CSS pixels.
    #[arg(long, env = "BOARD2PDF_ROW_HEIGHT", default_value_t = 450.0)]
    row_height: f64,

    /// Gap between images and between rows, in CSS pixels.
    #[arg(long, env = "BOARD2PDF_SPACING", default_value_t = 10.0)]
    spacing: f64,

    /// How to lay out the final row.
    #[arg(long, env = "BOARD2PDF_LAST_ROW", value_enum, default_value = "justify")]
    last_row: LastRowArg,

    /// Concurrent image downloads (1 = sequential).
    #[arg(short, long, env = "BOARD2PDF_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Per-request image timeout in seconds.
    #[arg(long, env = "BOARD2PDF_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Browser operation timeout in seconds.
    #[arg(long, env = "BOARD2PDF_RENDER_TIMEOUT", default_value_t = 60)]
    render_timeout: u64,

    /// Wait after the board page loads before reading it, in milliseconds.
    #[arg(long, env = "BOARD2PDF_SETTLE_MS", default_value_t = 1500)]
    settle_ms: u64,

    /// Skip printing the PDF.
    #[arg(long, env = "BOARD2PDF_NO_PDF")]
    no_pdf: bool,

    /// Skip writing gallery.json.
    #[arg(long, env = "BOARD2PDF_NO_MANIFEST")]
    no_manifest: bool,

    /// Print the result as JSON on stdout.
    #[arg(long, env = "BOARD2PDF_JSON")]
    json: bool,

    /// Print raw progress symbols instead of a progress bar.
    #[arg(long, env = "BOARD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BOARD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the list of failed images.
    #[arg(short, long, env = "BOARD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LastRowArg {
    /// Stretch the last row to the full width like every other row.
    Justify,
    /// Keep the last row at the target height, left aligned.
    Keep,
}

impl From<LastRowArg> for LastRowPolicy {
    fn from(v: LastRowArg) -> Self {
        match v {
            LastRowArg::Justify => LastRowPolicy::Justify,
            LastRowArg::Keep => LastRowPolicy::KeepTargetHeight,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (Some(url), Some(output_dir)) = (cli.url.clone(), cli.output.clone()) else {
        eprintln!("No --output or --url");
        std::process::exit(1);
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would fight the progress bar for the terminal.
    let show_bar = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_bar {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if cli.quiet || cli.json {
        None
    } else if show_bar {
        Some(BarProgress::new() as Arc<dyn FetchProgressCallback>)
    } else {
        Some(Arc::new(SymbolProgress))
    };

    let config = build_config(&cli, progress)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = build_gallery(&url, &output_dir, &config)
        .await
        .with_context(|| format!("Failed to export {url}"))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    report(&mut io::stderr().lock(), &output, cli.quiet).context("Failed to write report")?;

    Ok(())
}

/// Map CLI args to `GalleryConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GalleryConfig> {
    let mut builder = GalleryConfig::builder()
        .container_width(cli.container_width)
        .target_row_height(cli.row_height)
        .spacing(cli.spacing)
        .last_row(cli.last_row.clone().into())
        .concurrency(cli.concurrency)
        .fetch_timeout_secs(cli.timeout)
        .render_timeout_secs(cli.render_timeout)
        .settle_ms(cli.settle_ms)
        .render_pdf(!cli.no_pdf)
        .write_manifest(!cli.no_manifest);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Failed URLs, then (unless `quiet`) the summary line.
///
/// The failure list is printed even with `--quiet`.
fn report(w: &mut impl Write, output: &GalleryOutput, quiet: bool) -> io::Result<()> {
    if !output.errors.is_empty() {
        writeln!(
            w,
            "{} {} images could not be included:",
            red("✘"),
            output.errors.len()
        )?;
        for failed in output.errors.iter() {
            writeln!(w, "  {}  {}", failed.url, dim(&failed.error.to_string()))?;
        }
    }

    if quiet {
        return Ok(());
    }

    let target = output
        .files
        .pdf
        .as_ref()
        .unwrap_or(&output.files.index_html)
        .display()
        .to_string();

    writeln!(
        w,
        "{}  {}  {} rows  {}ms  →  {}",
        if output.errors.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        },
        summarize(output),
        output.stats.rows,
        output.stats.total_duration_ms,
        bold(&target),
    )
}
