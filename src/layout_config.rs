//! Export layout – the intermediate representation between pagination and
//! PDF rendering. This is the "frozen" structure that encodes exactly where
//! the captured invoice image goes on each page.

use serde::{Deserialize, Serialize};

/// A complete paginated export ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLayout {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "ExportLayout::default_title")]
    pub title: String,
    /// Width of each page in millimetres.
    pub page_width_mm: f32,
    /// Height of each page in millimetres.
    pub page_height_mm: f32,
    /// Ordered list of pages, at least one.
    pub pages: Vec<PagePlacement>,
}

/// Where the source image sits on one page.
///
/// Every page shows the same full image; only `y` changes, so each page
/// exposes a different vertical band of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePlacement {
    /// 1-based page number.
    pub page_number: usize,
    /// Left edge of the image from the page's left edge, in mm.
    pub x: f32,
    /// Top edge of the image from the page's top edge, in mm. Negative
    /// values push the image above the page.
    pub y: f32,
    /// Drawn image width in mm.
    pub width: f32,
    /// Drawn image height in mm.
    pub height: f32,
}

impl ExportLayout {
    /// Create an empty A4 portrait layout.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Tax Invoice".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}
