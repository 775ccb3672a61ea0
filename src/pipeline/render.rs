//! Browser collaboration: serialise a live board page, print the grid to PDF.
//!
//! ## Why spawn_blocking?
//!
//! `headless_chrome` drives Chrome over a synchronous DevTools connection;
//! every call blocks the calling thread until Chrome answers.
//! `tokio::task::spawn_blocking` moves that work onto the blocking pool so the
//! fetch stage's runtime workers never stall behind a page load.
//!
//! ## Why a fresh browser per call?
//!
//! A run needs the browser at most twice (once for the board, once for the
//! PDF) and those calls are minutes apart. Launching per call keeps
//! [`ChromeRenderer`] a plain `Clone` value with no process to babysit, and a
//! crashed Chrome only costs the call that crashed it.

use crate::config::{GalleryConfig, PdfOptions};
use crate::error::Board2PdfError;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Window size used for both the board page and the composed grid.
const WINDOW_SIZE: (u32, u32) = (1280, 1024);

/// What the orchestrator needs from a browser.
pub trait PageRenderer: Send + Sync {
    /// Load `url`, let it settle, and return the serialised DOM.
    fn render_markup(&self, url: &str) -> impl Future<Output = Result<String, Board2PdfError>> + Send;

    /// Open the local HTML file at `html_path` and print it; returns the PDF bytes.
    fn print_pdf(&self, html_path: &Path) -> impl Future<Output = Result<Vec<u8>, Board2PdfError>> + Send;
}

/// [`PageRenderer`] backed by a locally installed Chrome/Chromium.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    settle: Duration,
    timeout: Duration,
    pdf: PdfOptions,
}

impl ChromeRenderer {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.settle_ms),
            timeout: Duration::from_secs(config.render_timeout_secs),
            pdf: config.pdf,
        }
    }
}

impl PageRenderer for ChromeRenderer {
    async fn render_markup(&self, url: &str) -> Result<String, Board2PdfError> {
        info!("Rendering board page: {}", url);
        let this = self.clone();
        let url = url.to_string();
        let task_url = url.clone();

        tokio::task::spawn_blocking(move || this.render_blocking(&task_url))
            .await
            .map_err(|e| Board2PdfError::RenderFailed {
                url,
                detail: format!("render task panicked: {e}"),
            })?
    }

    async fn print_pdf(&self, html_path: &Path) -> Result<Vec<u8>, Board2PdfError> {
        info!("Printing PDF from {}", html_path.display());
        let this = self.clone();
        let path = html_path.to_path_buf();
        let task_path = path.clone();

        tokio::task::spawn_blocking(move || this.print_blocking(&task_path))
            .await
            .map_err(|e| Board2PdfError::PdfFailed {
                path,
                detail: format!("print task panicked: {e}"),
            })?
    }
}

impl ChromeRenderer {
    fn launch(&self) -> Result<Browser, String> {
        let options = LaunchOptions {
            headless: true,
            window_size: Some(WINDOW_SIZE),
            idle_browser_timeout: self.timeout,
            ..Default::default()
        };
        Browser::new(options).map_err(|e| format!("failed to launch Chrome: {e}"))
    }

    fn render_blocking(&self, url: &str) -> Result<String, Board2PdfError> {
        let failed = |e: &dyn Display| render_failed(url, e);

        let browser = self.launch().map_err(|e| failed(&e))?;
        let tab = browser.new_tab().map_err(|e| failed(&e))?;
        tab.set_default_timeout(self.timeout);
        tab.navigate_to(url)
            .map_err(|e| failed(&e))?
            .wait_until_navigated()
            .map_err(|e| failed(&e))?;

        // The grid is filled by script after the load event.
        std::thread::sleep(self.settle);

        let html = tab.get_content().map_err(|e| failed(&e))?;
        debug!("Serialised {} bytes of markup from {}", html.len(), url);
        Ok(html)
    }

    fn print_blocking(&self, html_path: &Path) -> Result<Vec<u8>, Board2PdfError> {
        let failed = |e: &dyn Display| pdf_failed(html_path, e);

        let absolute = std::fs::canonicalize(html_path).map_err(|e| failed(&e))?;
        let file_url = format!("file://{}", absolute.display());

        let browser = self.launch().map_err(|e| failed(&e))?;
        let tab = browser.new_tab().map_err(|e| failed(&e))?;
        tab.set_default_timeout(self.timeout);
        tab.navigate_to(&file_url)
            .map_err(|e| failed(&e))?
            .wait_until_navigated()
            .map_err(|e| failed(&e))?;

        tab.call_method(Emulation::SetEmulatedMedia {
            media: Some("screen".to_string()),
            features: None,
        })
        .map_err(|e| failed(&e))?;

        let margin = self.pdf.margin_in();
        let pdf = tab
            .print_to_pdf(Some(PrintToPdfOptions {
                paper_width: Some(self.pdf.paper_width_in),
                paper_height: Some(self.pdf.paper_height_in),
                margin_top: Some(margin),
                margin_bottom: Some(margin),
                margin_left: Some(margin),
                margin_right: Some(margin),
                print_background: Some(self.pdf.print_background),
                ..Default::default()
            }))
            .map_err(|e| failed(&e))?;

        debug!("Printed {} bytes of PDF", pdf.len());
        Ok(pdf)
    }
}

fn render_failed(url: &str, e: &dyn Display) -> Board2PdfError {
    Board2PdfError::RenderFailed {
        url: url.to_string(),
        detail: e.to_string(),
    }
}

fn pdf_failed(path: &Path, e: &dyn Display) -> Board2PdfError {
    Board2PdfError::PdfFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}
