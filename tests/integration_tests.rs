//! Integration tests for the invoice pipeline.
//!
//! These tests validate:
//! - Form events drive the state the way the invoice form does
//! - Preview totals, padding and words match the printed invoice
//! - Pagination slices tall captures into ordered pages
//! - PDF output exists and has valid format

use std::io::Cursor;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use invoice_forge::invoice::{apply, HeaderField, InvoiceEvent, InvoiceState, ItemField};
use invoice_forge::layout_config::ExportLayout;
use invoice_forge::pagination::{paginate, PageGeometry};
use invoice_forge::pipeline::{export_captured, export_pdf, CapturedImage, ExportConfig};
use invoice_forge::preview::{build_preview, PreviewDocument, MIN_ROWS};
use invoice_forge::tax::TaxKind;
use invoice_forge::templates::invoice_html;
use invoice_forge::{CaptureError, ExportError};

// =====================================================================
// Helper
// =====================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn edit(index: usize, field: ItemField, value: &str) -> InvoiceEvent {
    InvoiceEvent::EditItem {
        index,
        field,
        value: value.to_string(),
    }
}

fn toggle(kind: TaxKind, enabled: bool) -> InvoiceEvent {
    InvoiceEvent::ToggleTax { kind, enabled }
}

/// A filled-in intra-state invoice with three items.
fn sample_state() -> InvoiceState {
    let date = NaiveDate::from_ymd_opt(2025, 1, 15);
    let events = vec![
        InvoiceEvent::EditHeader {
            field: HeaderField::InvoiceNo,
            value: "GT-0042".into(),
        },
        InvoiceEvent::EditHeader {
            field: HeaderField::CustomerName,
            value: "Sharma Traders".into(),
        },
        InvoiceEvent::SetInvoiceDate { date },
        InvoiceEvent::SetPurchaseOrderDate { date },
        edit(0, ItemField::Name, "Weighing Scale"),
        edit(0, ItemField::Uom, "Nos."),
        edit(0, ItemField::Quantity, "2"),
        edit(0, ItemField::Rate, "300"),
        InvoiceEvent::AddItem,
        edit(1, ItemField::Name, "Calibration"),
        edit(1, ItemField::Quantity, "1"),
        edit(1, ItemField::Rate, "250"),
        InvoiceEvent::AddItem,
        edit(2, ItemField::Name, "Stamping fee"),
        edit(2, ItemField::Quantity, "1"),
        edit(2, ItemField::Rate, "150"),
        toggle(TaxKind::Cgst, true),
        toggle(TaxKind::Sgst, true),
    ];
    events.into_iter().fold(InvoiceState::new(), apply)
}

fn digest(text: &str) -> Vec<u8> {
    Sha256::digest(text.as_bytes()).to_vec()
}

// =====================================================================
// State + preview tests
// =====================================================================

#[test]
fn intra_state_invoice_totals() {
    let doc = build_preview(&sample_state());
    assert_eq!(doc.item_count, 3);
    assert_eq!(doc.subtotal, "1000.00");
    let amounts: Vec<&str> = doc.tax_rows.iter().map(|r| r.amount.as_str()).collect();
    assert_eq!(amounts, ["90.00", "90.00", "0.00", "0.00"]);
    assert_eq!(doc.grand_total, "\u{20B9} 1180.00");
    assert_eq!(
        doc.amount_in_words,
        "Rupees One Thousand One Hundred Eighty Only"
    );
}

#[test]
fn switching_to_igst_keeps_grand_total() {
    let state = apply(sample_state(), toggle(TaxKind::Igst, true));
    assert!(!state.taxes.cgst && !state.taxes.sgst);
    let doc = build_preview(&state);
    let amounts: Vec<&str> = doc.tax_rows.iter().map(|r| r.amount.as_str()).collect();
    assert_eq!(amounts, ["0.00", "0.00", "0.00", "180.00"]);
    assert_eq!(doc.grand_total, "\u{20B9} 1180.00");
}

#[test]
fn three_items_still_show_ten_rows() {
    let doc = build_preview(&sample_state());
    assert_eq!(doc.rows.len(), MIN_ROWS);
    assert_eq!(doc.rows.iter().filter(|r| r.is_blank()).count(), 7);
}

#[test]
fn header_fields_and_dates() {
    let doc = build_preview(&sample_state());
    assert_eq!(doc.invoice_no, "GT-0042");
    assert_eq!(doc.customer_name, "Sharma Traders");
    assert_eq!(doc.customer_address, "N/A");
    assert_eq!(doc.invoice_date, "15-01-2025");
    assert_eq!(doc.purchase_order_date, "15/01/2025");
}

#[test]
fn removing_items_updates_subtotal() {
    let state = apply(sample_state(), InvoiceEvent::RemoveItem { index: 1 });
    let doc = build_preview(&state);
    assert_eq!(doc.item_count, 2);
    assert_eq!(doc.subtotal, "750.00");
    assert_eq!(doc.rows[1].name, "Stamping fee");
    assert_eq!(doc.rows[1].index, Some(2));
}

#[test]
fn non_numeric_entries_count_as_zero() {
    let state = [
        edit(0, ItemField::Name, "Mystery"),
        edit(0, ItemField::Quantity, "two"),
        edit(0, ItemField::Rate, "100"),
    ]
    .into_iter()
    .fold(InvoiceState::default(), apply);
    let doc = build_preview(&state);
    assert_eq!(doc.item_count, 1);
    assert_eq!(doc.rows[0].amount, "0.00");
    assert_eq!(doc.subtotal, "0.00");
}

#[test]
fn preview_output_is_deterministic() {
    let state = sample_state();
    let a = build_preview(&state);
    let b = build_preview(&state);
    assert_eq!(digest(&a.to_json()), digest(&b.to_json()));
    assert_eq!(
        digest(&invoice_html(&a).unwrap()),
        digest(&invoice_html(&b).unwrap())
    );
}

#[test]
fn state_json_roundtrip_preserves_preview() {
    let state = sample_state();
    let parsed = InvoiceState::from_json(&state.to_json()).unwrap();
    assert_eq!(build_preview(&parsed).rows, build_preview(&state).rows);
}

// =====================================================================
// Pagination tests
// =====================================================================

#[test]
fn short_capture_fits_one_page() {
    let layout = paginate(900.0, 800.0, &PageGeometry::default());
    assert_eq!(layout.pages.len(), 1);
    assert_eq!(layout.pages[0].y, 5.0);
}

#[test]
fn tall_capture_spans_pages_with_decreasing_offsets() {
    let layout = paginate(2800.0, 800.0, &PageGeometry::default());
    assert_eq!(layout.pages.len(), 3);
    for pair in layout.pages.windows(2) {
        assert!(pair[1].y < pair[0].y);
        assert_eq!(pair[1].page_number, pair[0].page_number + 1);
    }
}

#[test]
fn layout_json_roundtrip() {
    let layout = paginate(2800.0, 800.0, &PageGeometry::default());
    let parsed = ExportLayout::from_json(&layout.to_json()).unwrap();
    assert_eq!(parsed.pages.len(), 3);
    assert!((parsed.page_height_mm - 297.0).abs() < 0.01);
}

// =====================================================================
// Export tests
// =====================================================================

#[test]
fn export_single_page_invoice() {
    init_logging();
    let capture = |_: &PreviewDocument, _: &str, _: f32| -> Result<CapturedImage, CaptureError> {
        Ok(CapturedImage::from_bytes(png(400, 450)))
    };
    let doc = export_pdf(&sample_state(), &capture, &ExportConfig::default()).unwrap();
    assert_valid_pdf(&doc.bytes);
    assert_eq!(doc.file_name, "invoice_GT-0042.pdf");
    assert_eq!(doc.layout.pages.len(), 1);
    assert_eq!(doc.layout.title, "Tax Invoice");
}

#[test]
fn export_tall_capture_to_three_pages() {
    init_logging();
    // 200 x 700 px at 200 mm content width scales to 700 mm.
    let doc = export_captured(
        &InvoiceState::default(),
        CapturedImage::from_bytes(png(200, 700)),
        &ExportConfig::default(),
    )
    .unwrap();
    assert_valid_pdf(&doc.bytes);
    assert_eq!(doc.file_name, "invoice_draft.pdf");
    let ys: Vec<f32> = doc.layout.pages.iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![5.0, -297.0, -594.0]);
}

#[test]
fn export_from_data_uri() {
    use base64::Engine as _;
    let uri = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png(50, 50))
    );
    let captured = CapturedImage::from_data_uri(&uri).unwrap();
    let doc = export_captured(&sample_state(), captured, &ExportConfig::default()).unwrap();
    assert_valid_pdf(&doc.bytes);
}

#[test]
fn capture_failure_produces_no_document() {
    init_logging();
    let capture = |_: &PreviewDocument, _: &str, _: f32| -> Result<CapturedImage, CaptureError> {
        Err(CaptureError::new("renderer crashed"))
    };
    let result = export_pdf(&sample_state(), &capture, &ExportConfig::default());
    match result {
        Err(ExportError::Capture(e)) => assert_eq!(e.to_string(), "renderer crashed"),
        other => panic!("expected capture error, got {other:?}"),
    }
}

#[test]
fn capture_sees_rendered_invoice() {
    let capture = |doc: &PreviewDocument, html: &str, scale: f32| -> Result<CapturedImage, CaptureError> {
        assert_eq!(scale, 2.0);
        assert!(html.contains("Sharma Traders"));
        assert!(html.contains(&doc.amount_in_words));
        Ok(CapturedImage::from_bytes(png(20, 20)))
    };
    export_pdf(&sample_state(), &capture, &ExportConfig::default()).unwrap();
}
