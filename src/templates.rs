//! HTML template for the invoice preview.
//!
//! [`invoice_html`] produces one self-contained page (inline CSS, no external
//! assets) that the host displays and captures for export. The markup lives
//! in `templates/invoice.html`; askama escapes every interpolated field.

use askama::Template;

use crate::error::{ExportError, Result};
use crate::preview::PreviewDocument;

#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoiceTemplate<'a> {
    doc: &'a PreviewDocument,
}

/// Render the preview as a standalone HTML page.
pub fn invoice_html(doc: &PreviewDocument) -> Result<String> {
    InvoiceTemplate { doc }
        .render()
        .map_err(|e| ExportError::Template(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceState, LineItem};
    use crate::preview::{build_preview, MIN_ROWS};

    #[test]
    fn renders_padded_table_and_footer() {
        let mut state = InvoiceState::default();
        state.items = vec![LineItem::new("Steel <rod>", "", "Kg", "2", "50")];
        let doc = build_preview(&state);
        let html = invoice_html(&doc).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(html.matches("<tr><td").count(), MIN_ROWS + 5);
        assert!(html.contains("<tr><td>1</td><td>Steel &lt;rod&gt;</td>"));
        assert!(!html.contains("<rod>"));
        for label in ["Sub Total", "CGST 9%", "SGST 9%", "CESS 1%", "IGST 18%"] {
            assert!(html.contains(label), "missing {label}");
        }
        assert!(html.contains("Rupees One Hundred Only"));
        assert!(html.contains("\u{20B9} 100.00"));
    }

    #[test]
    fn header_fields_are_escaped() {
        let mut state = InvoiceState::default();
        state.header.customer_name = "Tom & Jerry <Ltd>".into();
        let html = invoice_html(&build_preview(&state)).unwrap();
        assert!(html.contains("<p><b>Buyer:</b> Tom &amp; Jerry &lt;Ltd&gt;</p>"));
    }

    #[test]
    fn padding_rows_have_empty_cells() {
        let html = invoice_html(&build_preview(&InvoiceState::default())).unwrap();
        assert!(html.contains("<tr><td></td><td></td>"));
    }

    #[test]
    fn placeholders_appear() {
        let html = invoice_html(&build_preview(&InvoiceState::default())).unwrap();
        assert!(html.contains("<title>Invoice A000</title>"));
        assert!(html.contains("<p><b>Buyer:</b> N/A</p>"));
    }
}
