//! Invoice state – header fields, line items and tax selection, plus the
//! event transitions the form UI drives.
//!
//! State is a plain value: [`apply`] consumes a state and an event and
//! returns the next state. Nothing in the crate holds on to a state between
//! calls.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::tax::{TaxKind, TaxSelection};

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

/// One product row as entered on the form.
///
/// Numeric columns keep the text the user typed; [`read_decimal`] turns them
/// into numbers when needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub name: String,
    pub unit_price: String,
    pub uom: String,
    pub quantity: String,
    pub rate: String,
    /// `quantity × rate` rounded to paise; `None` until quantity or rate is
    /// first entered.
    pub amount: Option<Decimal>,
}

/// Editable column of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Name,
    UnitPrice,
    Uom,
    Quantity,
    Rate,
}

impl LineItem {
    /// Build a fully entered item with its amount computed.
    pub fn new(
        name: impl Into<String>,
        unit_price: impl Into<String>,
        uom: impl Into<String>,
        quantity: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        let mut item = Self {
            name: name.into(),
            unit_price: unit_price.into(),
            uom: uom.into(),
            quantity: quantity.into(),
            rate: rate.into(),
            amount: None,
        };
        item.recompute_amount();
        item
    }

    /// Set one column. Editing quantity or rate recomputes the amount.
    pub fn set(&mut self, field: ItemField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ItemField::Name => self.name = value,
            ItemField::UnitPrice => self.unit_price = value,
            ItemField::Uom => self.uom = value,
            ItemField::Quantity => {
                self.quantity = value;
                self.recompute_amount();
            }
            ItemField::Rate => {
                self.rate = value;
                self.recompute_amount();
            }
        }
    }

    fn recompute_amount(&mut self) {
        let raw = read_decimal(&self.quantity).saturating_mul(read_decimal(&self.rate));
        self.amount = Some(round_to_paise(raw));
    }

    /// An item counts towards the subtotal once any of name, price,
    /// quantity or rate has been entered. UOM alone does not count.
    pub fn is_substantive(&self) -> bool {
        [&self.name, &self.unit_price, &self.quantity, &self.rate]
            .iter()
            .any(|s| !s.is_empty())
    }

    /// Amount as a number, zero if never computed.
    pub fn amount_value(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}

/// Leniently read a decimal from user input.
///
/// Leading whitespace is skipped and the longest numeric prefix is used
/// (`"12kg"` reads as 12, `"1e2"` as 100). Anything unreadable, negative or
/// out of range reads as 0.
pub fn read_decimal(input: &str) -> Decimal {
    let s = input.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.starts_with('-') {
        return Decimal::ZERO;
    }

    let mantissa_len = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let mut mantissa = &s[..mantissa_len];
    // A second '.' ends the number.
    if let Some(second) = mantissa
        .char_indices()
        .filter(|&(_, c)| c == '.')
        .nth(1)
        .map(|(i, _)| i)
    {
        mantissa = &mantissa[..second];
    }
    let mantissa = mantissa.trim_end_matches('.');
    if !mantissa.bytes().any(|b| b.is_ascii_digit()) {
        return Decimal::ZERO;
    }
    let mantissa = if mantissa.starts_with('.') {
        format!("0{mantissa}")
    } else {
        mantissa.to_string()
    };

    let rest = &s[mantissa_len..];
    let value = match exponent(rest) {
        Some(exp) => Decimal::from_scientific(&format!("{mantissa}e{exp}")),
        None => Decimal::from_str(&mantissa),
    };
    value.unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
}

/// Exponent suffix such as `e2` or `E-3`, if digits follow the marker.
fn exponent(rest: &str) -> Option<&str> {
    let body = rest.strip_prefix(&['e', 'E'][..])?;
    let sign_len = usize::from(body.starts_with(&['+', '-'][..]));
    let digits = body[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len() - sign_len);
    (digits > 0).then(|| &body[..sign_len + digits])
}

/// Round to two decimal places the way the amount column displays it.
pub fn round_to_paise(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Invoice header, customer and order details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceHeader {
    pub invoice_no: String,
    pub invoice_date: Option<NaiveDate>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_contact: String,
    pub customer_gst: String,
    pub purchase_order_no: String,
    pub purchase_order_date: Option<NaiveDate>,
    pub vehicle_no: String,
    pub delivery_note_no: String,
    pub stamped_on: String,
    pub next_stamping: String,
}

/// Free-text header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    InvoiceNo,
    CustomerName,
    CustomerAddress,
    CustomerContact,
    CustomerGst,
    PurchaseOrderNo,
    VehicleNo,
    DeliveryNoteNo,
    StampedOn,
    NextStamping,
}

impl InvoiceHeader {
    /// Empty header with invoice and purchase-order dates set to today.
    pub fn dated_today() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            invoice_date: Some(today),
            purchase_order_date: Some(today),
            ..Self::default()
        }
    }

    fn field_mut(&mut self, field: HeaderField) -> &mut String {
        match field {
            HeaderField::InvoiceNo => &mut self.invoice_no,
            HeaderField::CustomerName => &mut self.customer_name,
            HeaderField::CustomerAddress => &mut self.customer_address,
            HeaderField::CustomerContact => &mut self.customer_contact,
            HeaderField::CustomerGst => &mut self.customer_gst,
            HeaderField::PurchaseOrderNo => &mut self.purchase_order_no,
            HeaderField::VehicleNo => &mut self.vehicle_no,
            HeaderField::DeliveryNoteNo => &mut self.delivery_note_no,
            HeaderField::StampedOn => &mut self.stamped_on,
            HeaderField::NextStamping => &mut self.next_stamping,
        }
    }
}

// ---------------------------------------------------------------------------
// State + transitions
// ---------------------------------------------------------------------------

/// Everything the form holds. Always carries at least one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceState {
    #[serde(default)]
    pub header: InvoiceHeader,
    #[serde(default = "InvoiceState::default_items")]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub taxes: TaxSelection,
}

impl Default for InvoiceState {
    fn default() -> Self {
        Self {
            header: InvoiceHeader::default(),
            items: Self::default_items(),
            taxes: TaxSelection::default(),
        }
    }
}

impl InvoiceState {
    /// A fresh form: one blank item, today's dates, no taxes.
    pub fn new() -> Self {
        Self {
            header: InvoiceHeader::dated_today(),
            ..Self::default()
        }
    }

    fn default_items() -> Vec<LineItem> {
        vec![LineItem::default()]
    }

    /// Sum of amounts over substantive items.
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .filter(|item| item.is_substantive())
            .map(LineItem::amount_value)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON. An empty item list is replaced by one blank
    /// item.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let mut state: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        if state.items.is_empty() {
            state.items = Self::default_items();
        }
        Ok(state)
    }
}

/// A single user action on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvoiceEvent {
    /// Append a blank line item.
    AddItem,
    /// Remove the item at `index` (refused if it is the last one).
    RemoveItem { index: usize },
    /// Change one column of the item at `index`.
    EditItem {
        index: usize,
        field: ItemField,
        value: String,
    },
    /// Tick or untick a tax checkbox.
    ToggleTax { kind: TaxKind, enabled: bool },
    /// Change a free-text header field.
    EditHeader { field: HeaderField, value: String },
    SetInvoiceDate { date: Option<NaiveDate> },
    SetPurchaseOrderDate { date: Option<NaiveDate> },
}

/// Apply `event` to `state`, returning the next state.
///
/// Events that would break an invariant (removing the only item, indexing
/// past the end) leave the state unchanged.
pub fn apply(mut state: InvoiceState, event: InvoiceEvent) -> InvoiceState {
    match event {
        InvoiceEvent::AddItem => state.items.push(LineItem::default()),
        InvoiceEvent::RemoveItem { index } => {
            if state.items.len() <= 1 {
                log::warn!("Ignoring removal of the only line item");
            } else if index >= state.items.len() {
                log::warn!("Ignoring removal of line item {index}: out of range");
            } else {
                state.items.remove(index);
            }
        }
        InvoiceEvent::EditItem {
            index,
            field,
            value,
        } => match state.items.get_mut(index) {
            Some(item) => item.set(field, value),
            None => log::warn!("Ignoring edit of line item {index}: out of range"),
        },
        InvoiceEvent::ToggleTax { kind, enabled } => {
            state.taxes = state.taxes.toggled(kind, enabled);
        }
        InvoiceEvent::EditHeader { field, value } => *state.header.field_mut(field) = value,
        InvoiceEvent::SetInvoiceDate { date } => state.header.invoice_date = date,
        InvoiceEvent::SetPurchaseOrderDate { date } => state.header.purchase_order_date = date,
    }
    state
}
