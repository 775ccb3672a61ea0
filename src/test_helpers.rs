//! Shared fixtures for unit tests: encoded images, an in-memory HTTP source
//! and a renderer that never starts a browser.

use crate::error::Board2PdfError;
use crate::pipeline::fetch::{HttpError, HttpSource};
use crate::pipeline::render::PageRenderer;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Bmp)
}

/// Serves canned responses and records every requested URL.
///
/// Unknown URLs answer `404`.
#[derive(Default)]
pub struct MockSource {
    responses: HashMap<String, Result<Vec<u8>, HttpError>>,
    requests: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, response: Result<Vec<u8>, HttpError>) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpSource for MockSource {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(HttpError::Status(404)))
    }
}

/// Returns fixed markup and a fixed PDF body; records what it was asked to do.
#[derive(Default)]
pub struct MockRenderer {
    pub markup: String,
    pub rendered: Mutex<Vec<String>>,
    pub printed: Mutex<Vec<String>>,
}

impl MockRenderer {
    pub fn with_markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            ..Default::default()
        }
    }
}

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%mock\n";

impl PageRenderer for MockRenderer {
    async fn render_markup(&self, url: &str) -> Result<String, Board2PdfError> {
        self.rendered.lock().unwrap().push(url.to_string());
        Ok(self.markup.clone())
    }

    async fn print_pdf(&self, html_path: &Path) -> Result<Vec<u8>, Board2PdfError> {
        let html = std::fs::read_to_string(html_path).unwrap();
        self.printed.lock().unwrap().push(html);
        Ok(FAKE_PDF.to_vec())
    }
}
