//! Pipeline – ties together preview building, capture, pagination and
//! rendering into a single function call.
//!
//! Capturing the rendered invoice as an image is the host's job (a browser,
//! webview or headless renderer). It is the only step that may block; the
//! pipeline waits for it, then paginates and renders synchronously.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, ExportError, Result};
use crate::invoice::InvoiceState;
use crate::layout_config::ExportLayout;
use crate::pagination::{paginate, PageGeometry, A4_HEIGHT_MM, A4_WIDTH_MM, PAGE_MARGIN_MM};
use crate::preview::{build_preview, PreviewDocument};
use crate::render::{render_pdf, EncodedImage};
use crate::templates::invoice_html;

/// File stem used when the invoice has no number.
pub const DRAFT_FILE_STEM: &str = "draft";

/// Configuration for the export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Document title embedded in the PDF metadata (default: "Tax Invoice").
    pub title: String,
    /// Page width in mm (default: A4 = 210).
    pub page_width: f32,
    /// Page height in mm (default: A4 = 297).
    pub page_height: f32,
    /// Page margin in mm (default: 5).
    pub page_margin: f32,
    /// JPEG quality for the embedded image, 0–1 (default: 0.98).
    pub image_quality: f32,
    /// Scale factor requested from the capture step (default: 2).
    pub capture_scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "Tax Invoice".to_string(),
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            page_margin: PAGE_MARGIN_MM,
            image_quality: 0.98,
            capture_scale: 2.0,
        }
    }
}

impl ExportConfig {
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry {
            page_width: self.page_width,
            page_height: self.page_height,
            margin: self.page_margin,
        }
    }

    /// `image_quality` as the 1–100 scale JPEG encoders take.
    pub fn jpeg_quality(&self) -> u8 {
        let q = if self.image_quality.is_finite() {
            self.image_quality
        } else {
            1.0
        };
        (q * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// An image of the rendered invoice, as PNG or JPEG bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parse a `data:<mime>;base64,<data>` URI, the form canvas captures
    /// usually come in.
    pub fn from_data_uri(src: &str) -> Result<Self> {
        let Some(rest) = src.strip_prefix("data:") else {
            let preview: String = src.chars().take(80).collect();
            return Err(ExportError::InvalidDataUri(format!(
                "expected `data:image/png;base64,...`, got {preview:?}"
            )));
        };
        let (header, data) = rest.split_once(',').ok_or_else(|| {
            ExportError::InvalidDataUri(
                "missing `,` separator between header and data".to_string(),
            )
        })?;
        if !header.contains(";base64") {
            return Err(ExportError::InvalidDataUri(
                "only base64-encoded data URIs are supported".to_string(),
            ));
        }
        let bytes = BASE64_STD
            .decode(data.trim())
            .map_err(|e| ExportError::InvalidDataUri(format!("base64 decode error: {e}")))?;
        Ok(Self::from_bytes(bytes))
    }
}

/// The external collaborator that turns the rendered invoice into an image.
///
/// Implementations get both the structured preview and its HTML rendering
/// and should capture at `scale` times the CSS pixel size.
pub trait DocumentCapture {
    fn capture(
        &self,
        document: &PreviewDocument,
        html: &str,
        scale: f32,
    ) -> std::result::Result<CapturedImage, CaptureError>;
}

impl<F> DocumentCapture for F
where
    F: Fn(&PreviewDocument, &str, f32) -> std::result::Result<CapturedImage, CaptureError>,
{
    fn capture(
        &self,
        document: &PreviewDocument,
        html: &str,
        scale: f32,
    ) -> std::result::Result<CapturedImage, CaptureError> {
        self(document, html, scale)
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    /// `invoice_<number|draft>.pdf`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub layout: ExportLayout,
}

/// Output file name for an invoice number.
///
/// Path separators are replaced so the name stays a single component.
pub fn export_file_name(invoice_no: &str) -> String {
    let stem = if invoice_no.is_empty() {
        DRAFT_FILE_STEM.to_string()
    } else {
        invoice_no.replace(['/', '\\'], "_")
    };
    format!("invoice_{stem}.pdf")
}

/// Full pipeline: state → preview → capture → pages → PDF bytes.
///
/// A capture failure aborts the export; it is not retried.
pub fn export_pdf<C>(
    state: &InvoiceState,
    capture: &C,
    config: &ExportConfig,
) -> Result<ExportedDocument>
where
    C: DocumentCapture + ?Sized,
{
    // 1. Build preview + HTML
    let preview = build_preview(state);
    let html = invoice_html(&preview)?;

    // 2. Capture
    log::debug!("Capturing invoice {} at {}x", preview.invoice_no, config.capture_scale);
    let captured = capture.capture(&preview, &html, config.capture_scale)?;

    // 3–4. Paginate + render
    export_captured(state, captured, config)
}

/// Paginate and render an image the host has already captured.
pub fn export_captured(
    state: &InvoiceState,
    captured: CapturedImage,
    config: &ExportConfig,
) -> Result<ExportedDocument> {
    let image = encode_for_pdf(&captured, config.jpeg_quality())?;

    let mut layout = paginate(
        image.px_height as f32,
        image.px_width as f32,
        &config.geometry(),
    );
    layout.title = config.title.clone();

    let bytes = render_pdf(&layout, &image)?;

    Ok(ExportedDocument {
        file_name: export_file_name(&state.header.invoice_no),
        bytes,
        layout,
    })
}

/// Decode the capture and re-encode it as JPEG at `quality`.
pub fn encode_for_pdf(captured: &CapturedImage, quality: u8) -> Result<EncodedImage> {
    let decoded = image::load_from_memory(&captured.bytes)
        .map_err(|e| ExportError::ImageDecode(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (px_width, px_height) = rgb.dimensions();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ExportError::ImageEncode(e.to_string()))?;

    Ok(EncodedImage {
        bytes,
        px_width,
        px_height,
    })
}

/// Convenience: export with the default A4 config.
pub fn export_pdf_default<C>(state: &InvoiceState, capture: &C) -> Result<ExportedDocument>
where
    C: DocumentCapture + ?Sized,
{
    export_pdf(state, capture, &ExportConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    type CaptureResult = std::result::Result<CapturedImage, CaptureError>;

    fn capture_blank(_: &PreviewDocument, _: &str, _: f32) -> CaptureResult {
        Ok(CapturedImage::from_bytes(png(40, 45)))
    }

    fn capture_failing(_: &PreviewDocument, _: &str, _: f32) -> CaptureResult {
        Err(CaptureError::new("canvas tainted"))
    }

    fn capture_checked(doc: &PreviewDocument, html: &str, scale: f32) -> CaptureResult {
        assert_eq!(scale, 2.0);
        assert!(html.contains(&doc.invoice_no));
        Ok(CapturedImage::from_bytes(png(8, 8)))
    }

    #[test]
    fn pipeline_basic() {
        let doc = export_pdf_default(&InvoiceState::default(), &capture_blank).unwrap();
        assert_eq!(&doc.bytes[0..5], b"%PDF-");
        assert_eq!(doc.layout.pages.len(), 1);
        assert_eq!(doc.file_name, "invoice_draft.pdf");
    }

    #[test]
    fn capture_failure_aborts() {
        let err = export_pdf_default(&InvoiceState::default(), &capture_failing).unwrap_err();
        assert!(matches!(err, ExportError::Capture(_)));
        assert_eq!(err.to_string(), "Capture failed: canvas tainted");
    }

    #[test]
    fn capture_receives_scale_and_html() {
        export_pdf_default(&InvoiceState::default(), &capture_checked).unwrap();
    }

    #[test]
    fn file_names() {
        assert_eq!(export_file_name(""), "invoice_draft.pdf");
        assert_eq!(export_file_name("INV-42"), "invoice_INV-42.pdf");
        assert_eq!(export_file_name("24/25/7"), "invoice_24_25_7.pdf");
    }

    #[test]
    fn jpeg_quality_from_fraction() {
        assert_eq!(ExportConfig::default().jpeg_quality(), 98);
        let cfg = ExportConfig {
            image_quality: 3.0,
            ..ExportConfig::default()
        };
        assert_eq!(cfg.jpeg_quality(), 100);
        let cfg = ExportConfig {
            image_quality: f32::NAN,
            ..ExportConfig::default()
        };
        assert_eq!(cfg.jpeg_quality(), 100);
    }

    #[test]
    fn data_uri_parsing() {
        let uri = format!("data:image/png;base64,{}", BASE64_STD.encode(png(2, 2)));
        let img = CapturedImage::from_data_uri(&uri).unwrap();
        assert_eq!(img.bytes, png(2, 2));

        for bad in ["image.png", "data:image/png;base64", "data:image/png,abcd", "data:;base64,!!"] {
            assert!(
                matches!(
                    CapturedImage::from_data_uri(bad),
                    Err(ExportError::InvalidDataUri(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn encode_keeps_dimensions() {
        let img = encode_for_pdf(&CapturedImage::from_bytes(png(30, 70)), 98).unwrap();
        assert_eq!((img.px_width, img.px_height), (30, 70));
        // JPEG SOI marker
        assert_eq!(&img.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn undecodable_capture_is_an_error() {
        let err = export_captured(
            &InvoiceState::default(),
            CapturedImage::from_bytes(b"nope".to_vec()),
            &ExportConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::ImageDecode(_)));
    }

    #[test]
    fn config_from_partial_json() {
        let cfg: ExportConfig = serde_json::from_str(r#"{"page_margin": 10}"#).unwrap();
        assert_eq!(cfg.page_margin, 10.0);
        assert_eq!(cfg.page_width, 210.0);
        assert_eq!(cfg.geometry().content_width(), 190.0);
    }
}
