//! Page writer seam and the PDF backend.
//!
//! Coordinates handed to a [`PageWriter`] are millimetres from the page's
//! top-left corner. [`PdfWriter`] converts them to PDF points with the origin
//! at the bottom-left.

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::paginate::capture::PageFragment;
use crate::paginate::surface::PageSize;
use crate::{FolioError, Result};

const PT_PER_MM: f64 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 92;

/// Handle to an image registered with a [`PageWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub usize);

/// Where an image lands on the current page, in millimetres from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Sink for paginated output.
///
/// An image is registered once and may then be placed on any number of pages.
/// Anything drawn outside the current page's bounds is clipped.
pub trait PageWriter {
    fn register_image(&mut self, fragment: &PageFragment) -> Result<ImageHandle>;

    /// Starts a new page; later placements land on it.
    fn add_page(&mut self, size: PageSize) -> Result<()>;

    fn place_image(&mut self, image: ImageHandle, rect: ImageRect) -> Result<()>;
}

struct PendingPage {
    size: PageSize,
    operations: Vec<Operation>,
    images: Vec<usize>,
}

/// Writes pages into an in-memory PDF document.
pub struct PdfWriter {
    doc: Document,
    images: Vec<ObjectId>,
    pages: Vec<PendingPage>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self { doc: Document::with_version("1.5"), images: Vec::new(), pages: Vec::new() }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Assembles the page tree and serializes the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(FolioError::Write("document has no pages".to_string()));
        }

        let pages_id = self.doc.new_object_id();
        let mut kids = Vec::with_capacity(self.pages.len());

        for page in std::mem::take(&mut self.pages) {
            let content = Content { operations: page.operations };
            let encoded = content.encode().map_err(|e| FolioError::Write(format!("encoding page content: {e}")))?;
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

            let mut xobjects = Dictionary::new();
            for index in page.images {
                xobjects.set(image_name(index), self.images[index]);
            }

            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(to_pt(page.size.width_mm)),
                    Object::Real(to_pt(page.size.height_mm)),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).map_err(|e| FolioError::Write(format!("serializing PDF: {e}")))?;
        Ok(bytes)
    }

    fn current_page(&mut self) -> Result<&mut PendingPage> {
        self.pages.last_mut().ok_or_else(|| FolioError::Write("image placed before any page was added".to_string()))
    }
}

impl PageWriter for PdfWriter {
    fn register_image(&mut self, fragment: &PageFragment) -> Result<ImageHandle> {
        let rgb = fragment.image.to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| FolioError::Write(format!("encoding page image: {e}")))?;

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(rgb.width()),
                "Height" => i64::from(rgb.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);

        self.images.push(self.doc.add_object(stream));
        Ok(ImageHandle(self.images.len() - 1))
    }

    fn add_page(&mut self, size: PageSize) -> Result<()> {
        self.pages.push(PendingPage { size, operations: Vec::new(), images: Vec::new() });
        Ok(())
    }

    fn place_image(&mut self, image: ImageHandle, rect: ImageRect) -> Result<()> {
        if image.0 >= self.images.len() {
            return Err(FolioError::Write(format!("unknown image handle {}", image.0)));
        }

        let page = self.current_page()?;
        let page_height_pt = to_pt(page.size.height_mm);
        let bottom_pt = page_height_pt - to_pt(rect.y_mm + rect.height_mm);

        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(to_pt(rect.width_mm)),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(to_pt(rect.height_mm)),
                    Object::Real(to_pt(rect.x_mm)),
                    Object::Real(bottom_pt),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image_name(image.0).into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        if !page.images.contains(&image.0) {
            page.images.push(image.0);
        }
        Ok(())
    }
}

fn to_pt(mm: f64) -> f32 {
    (mm * PT_PER_MM) as f32
}

fn image_name(index: usize) -> String {
    format!("Im{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn fragment() -> PageFragment {
        PageFragment::new(DynamicImage::new_rgb8(42, 120), 2.0)
    }

    fn full_width(y_mm: f64) -> ImageRect {
        ImageRect { x_mm: 0.0, y_mm, width_mm: 210.0, height_mm: 600.0 }
    }

    #[test]
    fn test_writes_one_image_on_many_pages() {
        let mut writer = PdfWriter::new();
        let handle = writer.register_image(&fragment()).unwrap();
        for offset in [0.0, -297.0, -594.0] {
            writer.add_page(PageSize::A4).unwrap();
            writer.place_image(handle, full_width(offset)).unwrap();
        }
        assert_eq!(writer.page_count(), 3);

        let bytes = writer.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_place_before_page_fails() {
        let mut writer = PdfWriter::new();
        let handle = writer.register_image(&fragment()).unwrap();
        let err = writer.place_image(handle, full_width(0.0)).unwrap_err();
        assert!(matches!(err, FolioError::Write(_)));
    }

    #[test]
    fn test_unknown_handle_fails() {
        let mut writer = PdfWriter::new();
        writer.add_page(PageSize::A4).unwrap();
        assert!(writer.place_image(ImageHandle(3), full_width(0.0)).is_err());
    }

    #[test]
    fn test_empty_document_fails() {
        assert!(matches!(PdfWriter::new().finish(), Err(FolioError::Write(_))));
    }

    #[test]
    fn test_point_conversion() {
        assert!((to_pt(25.4) - 72.0).abs() < 1e-4);
        assert!((to_pt(297.0) - 841.89).abs() < 0.01);
    }
}
