//! Page band arithmetic.
//!
//! A captured bitmap is scaled to the physical page width, keeping its aspect
//! ratio, and then cut into page-height bands. Every band re-places the whole
//! bitmap shifted upward by the height already shown; the page boundary clips
//! the rest.

use crate::paginate::surface::PageSize;
use crate::{FolioError, Result};

/// Remainders thinner than this are treated as rounding noise, not a page.
const SLIVER_TOLERANCE_MM: f64 = 1e-6;

/// Placement of the shared bitmap on one physical page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// Zero-based page number.
    pub index: usize,
    /// Vertical offset of the bitmap's top edge from the page's top edge, in
    /// millimetres. Zero on the first page, negative afterwards.
    pub offset_mm: f64,
    /// Height of the band of the bitmap visible on this page.
    pub visible_height_mm: f64,
}

/// Height of a `width_px` × `height_px` bitmap once scaled to `page_width_mm`.
pub fn image_height_mm(width_px: u32, height_px: u32, page_width_mm: f64) -> f64 {
    f64::from(height_px) * page_width_mm / f64::from(width_px)
}

/// Cuts a bitmap into page bands.
///
/// Page 1 shows the bitmap at offset 0; while image height minus consumed
/// height is still positive another page is started at offset `-consumed`.
/// The number of pages is `ceil(image_height_mm / page.height_mm)`.
///
/// # Errors
///
/// Returns [`FolioError::Render`] when the bitmap has no pixels, since no
/// aspect ratio can be derived from it, and [`FolioError::InvalidInput`] when
/// the page size is not positive and finite.
pub fn slice_pages(width_px: u32, height_px: u32, page: PageSize) -> Result<Vec<PagePlacement>> {
    page.validate()?;
    if width_px == 0 || height_px == 0 {
        return Err(FolioError::Render(format!("captured bitmap is empty ({width_px}x{height_px} px)")));
    }

    let total_mm = image_height_mm(width_px, height_px, page.width_mm);
    let mut pages = Vec::with_capacity((total_mm / page.height_mm).ceil() as usize);
    let mut consumed = 0.0;

    loop {
        let remaining = total_mm - consumed;
        pages.push(PagePlacement {
            index: pages.len(),
            offset_mm: -consumed,
            visible_height_mm: remaining.min(page.height_mm),
        });
        consumed += page.height_mm;

        if total_mm - consumed <= SLIVER_TOLERANCE_MM {
            break;
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const A4: PageSize = PageSize::A4;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_image_height_preserves_aspect_ratio() {
        assert!(approx(image_height_mm(420, 1485, 210.0), 742.5));
        assert!(approx(image_height_mm(1588, 1588, 210.0), 210.0));
    }

    #[test]
    fn test_two_and_a_half_pages() {
        // 1485 px at 420 px wide is 742.5 mm on a 210 mm page: 2.5 A4 pages.
        let pages = slice_pages(420, 1485, A4).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(approx(pages[0].offset_mm, 0.0));
        assert!(approx(pages[1].offset_mm, -297.0));
        assert!(approx(pages[2].offset_mm, -594.0));
        assert!(approx(pages[0].visible_height_mm, 297.0));
        assert!(approx(pages[2].visible_height_mm, 148.5));
    }

    #[rstest]
    #[case(420, 10, 1)]
    #[case(420, 594, 1)]
    #[case(420, 595, 2)]
    #[case(420, 1188, 2)]
    #[case(420, 1189, 3)]
    #[case(100, 5000, 36)]
    fn test_page_count_is_ceiling(#[case] width: u32, #[case] height: u32, #[case] expected: usize) {
        let pages = slice_pages(width, height, A4).unwrap();
        let exact = (image_height_mm(width, height, A4.width_mm) / A4.height_mm).ceil() as usize;

        assert_eq!(pages.len(), expected);
        assert_eq!(pages.len(), exact.max(1));
        assert!(pages.iter().enumerate().all(|(i, p)| p.index == i));
    }

    #[test]
    fn test_empty_bitmap_is_render_error() {
        assert!(matches!(slice_pages(0, 100, A4), Err(FolioError::Render(_))));
        assert!(matches!(slice_pages(100, 0, A4), Err(FolioError::Render(_))));
    }

    #[rstest]
    #[case(210.0, 0.0)]
    #[case(210.0, -297.0)]
    #[case(210.0, f64::NAN)]
    #[case(0.0, 297.0)]
    fn test_degenerate_page_is_rejected(#[case] width_mm: f64, #[case] height_mm: f64) {
        let result = slice_pages(100, 100, PageSize { width_mm, height_mm });
        assert!(matches!(result, Err(FolioError::InvalidInput(_))));
    }
}
