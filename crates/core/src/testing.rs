//! Test doubles for the fetch, capture and page-writer seams.
//!
//! These let applications exercise extraction and pagination without network
//! access or an external renderer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::DynamicImage;
use url::Url;

use crate::fetch::{FetchedDocument, HttpFetcher};
use crate::paginate::{ImageHandle, ImageRect, PageFragment, PageSize, PageWriter, RasterCapture, RenderSurface};
use crate::{FolioError, Result};

/// An [`HttpFetcher`] serving canned pages by URL.
///
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    statuses: HashMap<String, u16>,
    pending: bool,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` with status 200 for `url`.
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(key(url), html.into());
        self
    }

    /// Answers `url` with a non-success `status`.
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(key(url), status);
        self
    }

    /// Never completes a fetch.
    pub fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    /// Number of fetches started.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn key(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl HttpFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.pending {
            std::future::pending::<()>().await;
        }

        if let Some(status) = self.statuses.get(url.as_str()) {
            return Err(FolioError::Fetch { status: Some(*status), message: format!("HTTP {status}") });
        }

        match self.pages.get(url.as_str()) {
            Some(html) => Ok(FetchedDocument {
                final_url: url.clone(),
                raw_html: html.clone(),
                http_status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
            }),
            None => Err(FolioError::Fetch { status: Some(404), message: "Not Found".to_string() }),
        }
    }
}

/// A [`RasterCapture`] returning a blank bitmap of fixed size.
#[derive(Debug)]
pub struct SolidCapture {
    width: u32,
    height: u32,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl SolidCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, failure: None, calls: AtomicUsize::new(0) }
    }

    /// Fails every capture with [`FolioError::Render`] carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RasterCapture for SolidCapture {
    async fn capture(&self, surface: &RenderSurface) -> Result<PageFragment> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(FolioError::Render(message.clone()));
        }

        Ok(PageFragment::new(DynamicImage::new_rgb8(self.width, self.height), surface.scale))
    }
}

/// A [`PageWriter`] that records what it was asked to draw.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    /// Number of registered images.
    pub images: usize,
    pub pages: Vec<PageSize>,
    /// `(page index, image, rect)` for every placement.
    pub placements: Vec<(usize, ImageHandle, ImageRect)>,
}

impl PageWriter for RecordingWriter {
    fn register_image(&mut self, _fragment: &PageFragment) -> Result<ImageHandle> {
        self.images += 1;
        Ok(ImageHandle(self.images - 1))
    }

    fn add_page(&mut self, size: PageSize) -> Result<()> {
        self.pages.push(size);
        Ok(())
    }

    fn place_image(&mut self, image: ImageHandle, rect: ImageRect) -> Result<()> {
        if self.pages.is_empty() {
            return Err(FolioError::Write("image placed before any page was added".to_string()));
        }
        self.placements.push((self.pages.len() - 1, image, rect));
        Ok(())
    }
}
