//! HTML to paged document.
//!
//! The [`Paginator`] lays a title and an HTML fragment out on an off-screen
//! surface one page wide, captures it as a single bitmap, scales the bitmap
//! to the page width and cuts it into page-height bands. Each page re-places
//! the same bitmap shifted upward, so the content is sliced at arbitrary
//! heights and text may be cut across a page boundary.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::Paginator;
//!
//! # #[tokio::main]
//! # async fn main() -> folio_core::Result<()> {
//! let paginator = Paginator::new();
//! let document = paginator.paginate("Title", "<p>Body</p>").await?;
//! std::fs::write(&document.file_name, document.to_pdf()?).ok();
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod pdf;
pub mod slice;
pub mod surface;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use capture::{CommandCapture, CommandCaptureConfig, PageFragment, RasterCapture};
pub use pdf::{ImageHandle, ImageRect, PageWriter, PdfWriter};
pub use slice::{PagePlacement, image_height_mm, slice_pages};
pub use surface::{PageConfig, PageSize, RenderSurface, SurfaceStyle, build_surface};

use crate::{FolioError, Result, Stage};

/// Name used when the title is blank.
pub const DEFAULT_FILE_STEM: &str = "document";

/// Renders content into page-sized bands of one captured bitmap.
#[derive(Clone)]
pub struct Paginator {
    config: PageConfig,
    capture: Arc<dyn RasterCapture>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    /// Creates a paginator for A4 pages captured by [`CommandCapture`].
    pub fn new() -> Self {
        Self::with_capture(PageConfig::default(), Arc::new(CommandCapture::default()))
    }

    pub fn with_capture(config: PageConfig, capture: Arc<dyn RasterCapture>) -> Self {
        Self { config, capture }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Paginates `content_html` under `title`.
    ///
    /// # Errors
    ///
    /// - [`FolioError::InvalidInput`] when the page configuration is degenerate.
    /// - [`FolioError::EmptyContent`] when the content is blank; nothing is captured.
    /// - [`FolioError::Render`] when the surface cannot be built or captured.
    pub async fn paginate(&self, title: &str, content_html: &str) -> Result<PaginatedDocument> {
        self.paginate_with_cancel(title, content_html, &CancellationToken::new()).await
    }

    /// Like [`paginate`](Self::paginate), abandoning the render when `cancel` fires.
    pub async fn paginate_with_cancel(
        &self, title: &str, content_html: &str, cancel: &CancellationToken,
    ) -> Result<PaginatedDocument> {
        self.config.validate()?;
        if content_html.trim().is_empty() {
            return Err(FolioError::EmptyContent);
        }

        let surface = build_surface(title, content_html, &self.config)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FolioError::Cancelled { stage: Stage::Render }),
            _ = tokio::time::sleep(self.config.settle_delay) => {}
        }

        let fragment = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FolioError::Cancelled { stage: Stage::Render }),
            fragment = self.capture.capture(&surface) => fragment?,
        };

        let page = self.config.page;
        let pages = slice_pages(fragment.width_px(), fragment.height_px(), page)?;
        let image_height_mm = image_height_mm(fragment.width_px(), fragment.height_px(), page.width_mm);

        tracing::info!(
            width_px = fragment.width_px(),
            height_px = fragment.height_px(),
            pages = pages.len(),
            "paginated content"
        );

        Ok(PaginatedDocument { file_name: document_file_name(title), page_size: page, image_height_mm, fragment, pages })
    }
}

/// A captured bitmap and its placement on each page.
#[derive(Debug, Clone)]
pub struct PaginatedDocument {
    /// Suggested output file name, see [`document_file_name`].
    pub file_name: String,
    pub page_size: PageSize,
    /// Height of the bitmap scaled to the page width.
    pub image_height_mm: f64,
    pub fragment: PageFragment,
    pub pages: Vec<PagePlacement>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Emits every page to `writer`, registering the bitmap once.
    pub fn write_to(&self, writer: &mut dyn PageWriter) -> Result<()> {
        let image = writer.register_image(&self.fragment)?;

        for placement in &self.pages {
            writer.add_page(self.page_size)?;
            writer.place_image(
                image,
                ImageRect {
                    x_mm: 0.0,
                    y_mm: placement.offset_mm,
                    width_mm: self.page_size.width_mm,
                    height_mm: self.image_height_mm,
                },
            )?;
        }

        Ok(())
    }

    /// Serializes the pages as a PDF document.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let mut writer = PdfWriter::new();
        self.write_to(&mut writer)?;
        writer.finish()
    }
}

/// Derives an output file name from a title.
///
/// Every character outside ASCII letters, digits and the CJK unified
/// ideographs block (U+4E00..=U+9FA5) becomes `_`; the result is lowercased
/// and given a `.pdf` extension. A blank title yields `document.pdf`.
pub fn document_file_name(title: &str) -> String {
    let title = title.trim();
    let stem = if title.is_empty() { DEFAULT_FILE_STEM } else { title };

    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c) { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    name.push_str(".pdf");
    name
}
