//! Preview builder – turns an [`InvoiceState`] into the fixed-shape document
//! shown on screen and captured for export.
//!
//! The table always has at least [`MIN_ROWS`] body rows and exactly four tax
//! rows in the footer, whichever taxes are selected.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::{round_to_paise, InvoiceState, LineItem};
use crate::tax::{compute_totals, InvoiceTotals, TaxKind};
use crate::words::to_words;

/// Minimum number of body rows in the item table.
pub const MIN_ROWS: usize = 10;

/// Shown in place of an empty optional field.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown when no invoice number was entered.
pub const INVOICE_NO_PLACEHOLDER: &str = "A000";

/// Currency marker prefixed to the grand total.
pub const CURRENCY_SYMBOL: &str = "\u{20B9}";

/// Rendered invoice, every field ready to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub invoice_no: String,
    /// `DD-MM-YYYY`.
    pub invoice_date: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_contact: String,
    pub customer_gst: String,
    pub purchase_order_no: String,
    /// `DD/MM/YYYY`.
    pub purchase_order_date: String,
    pub vehicle_no: String,
    pub delivery_note_no: String,
    pub stamped_on: String,
    pub next_stamping: String,

    /// Entered items followed by blank padding rows.
    pub rows: Vec<PreviewRow>,
    /// Number of substantive items.
    pub item_count: usize,
    pub subtotal: String,
    pub tax_rows: [TaxRow; 4],
    pub grand_total: String,
    pub amount_in_words: String,
    /// Unrounded figures behind the display strings.
    pub totals: InvoiceTotals,
}

/// One body row of the item table. Padding rows are entirely blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRow {
    /// 1-based position; `None` for padding rows.
    pub index: Option<usize>,
    pub name: String,
    pub unit_price: String,
    pub uom: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

impl PreviewRow {
    fn from_item(position: usize, item: &LineItem) -> Self {
        Self {
            index: Some(position),
            name: item.name.clone(),
            unit_price: item.unit_price.clone(),
            uom: item.uom.clone(),
            quantity: item.quantity.clone(),
            rate: item.rate.clone(),
            amount: item.amount.map(money).unwrap_or_default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.index.is_none()
    }

    /// S.No. cell text; empty for padding rows.
    pub fn index_label(&self) -> String {
        self.index.map(|i| i.to_string()).unwrap_or_default()
    }
}

/// Footer row for one tax category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRow {
    pub kind: TaxKind,
    pub label: String,
    pub amount: String,
}

impl PreviewDocument {
    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

/// Build the preview document for `state`.
pub fn build_preview(state: &InvoiceState) -> PreviewDocument {
    let header = &state.header;

    let mut rows: Vec<PreviewRow> = state
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| PreviewRow::from_item(i + 1, item))
        .collect();
    if rows.len() < MIN_ROWS {
        rows.resize_with(MIN_ROWS, PreviewRow::default);
    }

    let item_count = state.items.iter().filter(|i| i.is_substantive()).count();
    let totals = compute_totals(state.subtotal(), &state.taxes);

    let tax_rows = TaxKind::ALL.map(|kind| TaxRow {
        kind,
        label: kind.label().to_string(),
        amount: money(totals.amount(kind)),
    });

    let rupees = totals.grand_total.floor().to_u64().unwrap_or_else(|| {
        log::warn!("Grand total {} too large to write in words", totals.grand_total);
        u64::MAX
    });

    log::debug!(
        "Preview: {} rows, {} substantive, grand total {}",
        rows.len(),
        item_count,
        totals.grand_total
    );

    PreviewDocument {
        invoice_no: or_placeholder(&header.invoice_no, INVOICE_NO_PLACEHOLDER),
        invoice_date: format_invoice_date(header.invoice_date),
        customer_name: or_na(&header.customer_name),
        customer_address: or_na(&header.customer_address),
        customer_contact: or_na(&header.customer_contact),
        customer_gst: or_na(&header.customer_gst),
        purchase_order_no: or_na(&header.purchase_order_no),
        purchase_order_date: format_purchase_order_date(header.purchase_order_date),
        vehicle_no: or_na(&header.vehicle_no),
        delivery_note_no: or_na(&header.delivery_note_no),
        stamped_on: or_na(&header.stamped_on),
        next_stamping: or_na(&header.next_stamping),
        rows,
        item_count,
        subtotal: money(totals.subtotal),
        tax_rows,
        grand_total: format!("{CURRENCY_SYMBOL} {}", money(totals.grand_total)),
        amount_in_words: format!("Rupees {} Only", to_words(rupees)),
        totals,
    }
}

/// Invoice date as `DD-MM-YYYY`.
pub fn format_invoice_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Purchase-order date as `DD/MM/YYYY`.
///
/// Uses a slash, unlike the hyphen in [`format_invoice_date`].
pub fn format_purchase_order_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn money(value: Decimal) -> String {
    let mut value = round_to_paise(value);
    value.rescale(2);
    value.to_string()
}

fn or_na(value: &str) -> String {
    or_placeholder(value, NOT_AVAILABLE)
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}
