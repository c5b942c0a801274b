//! Error types for invoice export.
//!
//! Building a preview never fails; only the export path (capture, image
//! handling, PDF writing) can.

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Failure reported by the image-capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CaptureError(pub String);

impl CaptureError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors that abort an export. No partial document is produced.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The rendered invoice could not be captured as an image.
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Captured bytes are not a PNG or JPEG image.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Re-encoding the capture for embedding failed.
    #[error("Image encode error: {0}")]
    ImageEncode(String),

    /// Capture was supplied as a malformed `data:` URI.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// The HTML template failed to render.
    #[error("Template error: {0}")]
    Template(String),

    /// printpdf rejected the image or document.
    #[error("PDF error: {0}")]
    Pdf(String),
}
