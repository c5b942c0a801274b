//! Pagination – slices one tall captured image across fixed-size pages.
//!
//! The image is scaled to the page's content width and drawn in full on
//! every page. Page 1 places it at the top margin; each following page shifts
//! it up by one page height so the next uncovered band shows at the top.

use serde::{Deserialize, Serialize};

use crate::layout_config::*;

/// Default A4 portrait page width in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;
/// Default A4 portrait page height in millimetres.
pub const A4_HEIGHT_MM: f32 = 297.0;
/// Default page margin in millimetres.
pub const PAGE_MARGIN_MM: f32 = 5.0;
/// Most pages a single layout will hold.
pub const MAX_PAGES: usize = 1000;

/// Page size and margin, all in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            margin: PAGE_MARGIN_MM,
        }
    }
}

impl PageGeometry {
    /// Width available to the image once both side margins are removed.
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Height of an `image_width × image_height` image once scaled to
    /// [`content_width`](Self::content_width). Zero for degenerate input.
    pub fn scaled_height(&self, image_width: f32, image_height: f32) -> f32 {
        if !(image_width > 0.0 && image_height > 0.0)
            || !image_width.is_finite()
            || !image_height.is_finite()
        {
            return 0.0;
        }
        let scaled = image_height * (self.content_width() / image_width);
        if scaled.is_finite() {
            scaled
        } else {
            0.0
        }
    }
}

/// Compute the page placements for an image of the given pixel size.
///
/// Always yields at least one page. Page `n > 1` sits at
/// `remaining − scaled_height`, where `remaining` starts at
/// `scaled_height − page_height` and drops by `page_height` per page; pages
/// stop once `remaining` goes negative. Layouts longer than [`MAX_PAGES`]
/// are cut off there.
pub fn paginate(image_height: f32, image_width: f32, geometry: &PageGeometry) -> ExportLayout {
    let mut layout = ExportLayout {
        page_width_mm: geometry.page_width,
        page_height_mm: geometry.page_height,
        ..ExportLayout::a4()
    };

    let width = geometry.content_width();
    let height = geometry.scaled_height(image_width, image_height);
    let place = |page_number: usize, y: f32| PagePlacement {
        page_number,
        x: geometry.margin,
        y,
        width,
        height,
    };

    layout.pages.push(place(1, geometry.margin));

    let scaled = f64::from(height);
    let page_height = f64::from(geometry.page_height);
    let extra = extra_pages(scaled, page_height);
    if extra >= MAX_PAGES {
        log::warn!(
            "Image needs {} pages; keeping the first {MAX_PAGES}",
            extra.saturating_add(1)
        );
    }
    for i in 0..extra.min(MAX_PAGES - 1) {
        let remaining = scaled - page_height * (i as f64 + 1.0);
        layout.pages.push(place(i + 2, (remaining - scaled) as f32));
    }

    log::debug!(
        "Paginated {image_width}x{image_height} px image ({height:.2} mm tall) into {} page(s)",
        layout.pages.len()
    );
    layout
}

/// Pages after the first: one for every step at which
/// `scaled_height − k·page_height` is still non-negative.
fn extra_pages(scaled_height: f64, page_height: f64) -> usize {
    // A non-positive page height would never consume the image.
    if !(page_height > 0.0 && scaled_height >= page_height) {
        return 0;
    }
    (((scaled_height - page_height) / page_height).floor() as usize).saturating_add(1)
}
