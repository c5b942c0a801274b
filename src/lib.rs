//! # invoice-forge – GST tax invoice preview and paginated PDF export
//!
//! This crate turns the contents of an invoice form into a printable tax
//! invoice. The pipeline stages are:
//!
//! 1. **State** – header, line items and tax selection, edited through
//!    events ([`invoice`])
//! 2. **Totals** – CGST/SGST/CESS/IGST aggregation ([`tax`])
//! 3. **Preview** – padded item table, tax footer, amount in words
//!    ([`preview`], [`words`], [`templates`])
//! 4. **Paginate** – slice one captured image across A4 pages ([`pagination`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! Capturing the rendered preview as an image is left to the host through
//! [`pipeline::DocumentCapture`]. A C-compatible FFI surface is exposed via
//! the [`ffi`] module.

pub mod error;
pub mod ffi;
pub mod invoice;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod tax;
pub mod templates;
pub mod words;

// Re-exports for convenience
pub use error::{CaptureError, ExportError};
pub use invoice::{apply, InvoiceEvent, InvoiceState, LineItem};
pub use pipeline::{export_captured, export_pdf, CapturedImage, DocumentCapture, ExportConfig};
pub use preview::{build_preview, PreviewDocument};
pub use tax::{compute_totals, TaxKind, TaxSelection};
pub use words::to_words;
