//! PDF renderer – takes an [`ExportLayout`] plus the encoded invoice image and
//! produces PDF bytes using `printpdf` (v0.8 ops-based API).

use printpdf::*;

use crate::error::{ExportError, Result};
use crate::layout_config::*;

/// Points per millimetre (72 pt per 25.4 mm).
const PT_PER_MM: f32 = 72.0 / 25.4;

/// An encoded (PNG or JPEG) image together with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Render an ExportLayout into PDF bytes.
///
/// The image is registered once as an XObject and drawn on every page at
/// that page's placement.
pub fn render_pdf(layout: &ExportLayout, image: &EncodedImage) -> Result<Vec<u8>> {
    let page_w = Mm(layout.page_width_mm);
    let page_h = Mm(layout.page_height_mm);
    let page_h_pt = mm_to_pt(layout.page_height_mm);

    let mut doc = PdfDocument::new(&layout.title);

    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();
    let raw = RawImage::decode_from_bytes(&image.bytes, &mut img_warnings)
        .map_err(|e| ExportError::Pdf(format!("image embed failed: {e}")))?;
    if !img_warnings.is_empty() {
        log::warn!(
            "printpdf reported {} warning(s) while embedding the image",
            img_warnings.len()
        );
    }
    let xobj_id = doc.add_image(&raw);

    // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px_dim.
    let scale_x = if image.px_width > 0 {
        Some(1.0 / image.px_width as f32)
    } else {
        None
    };
    let scale_y = if image.px_height > 0 {
        Some(1.0 / image.px_height as f32)
    } else {
        None
    };

    let mut pages = Vec::with_capacity(layout.pages.len());
    for placement in &layout.pages {
        let mut ops = Vec::new();

        if let (Some(sx), Some(sy)) = (scale_x, scale_y) {
            if placement.height > 0.0 {
                // PDF origin is bottom-left; placements are measured from the
                // top-left. translate_y = bottom edge of the image.
                let bottom_y = page_h_pt - mm_to_pt(placement.y) - mm_to_pt(placement.height);
                ops.push(Op::UseXobject {
                    id: xobj_id.clone(),
                    transform: XObjectTransform {
                        translate_x: Some(Pt(mm_to_pt(placement.x))),
                        translate_y: Some(Pt(bottom_y)),
                        dpi: Some(72.0),
                        scale_x: Some(mm_to_pt(placement.width) * sx),
                        scale_y: Some(mm_to_pt(placement.height) * sy),
                        rotate: None,
                    },
                });
            }
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());

    log::debug!(
        "Rendered {} page(s), {} bytes",
        layout.pages.len().max(1),
        bytes.len()
    );
    Ok(bytes)
}
