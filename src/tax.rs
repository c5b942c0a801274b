//! GST tax selection and totals.
//!
//! Four fixed levies are supported: CGST 9%, SGST 9%, CESS 1% and IGST 18%.
//! IGST (inter-state) is mutually exclusive with CGST/SGST (intra-state);
//! CESS is independent of both.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the four fixed tax categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxKind {
    Cgst,
    Sgst,
    Cess,
    Igst,
}

impl TaxKind {
    /// All categories in the fixed footer order.
    pub const ALL: [TaxKind; 4] = [TaxKind::Cgst, TaxKind::Sgst, TaxKind::Cess, TaxKind::Igst];

    /// Fractional rate (e.g. `0.09` for 9%).
    pub fn rate(self) -> Decimal {
        match self {
            TaxKind::Cgst | TaxKind::Sgst => Decimal::new(9, 2),
            TaxKind::Cess => Decimal::new(1, 2),
            TaxKind::Igst => Decimal::new(18, 2),
        }
    }

    /// Footer label, e.g. `"CGST 9%"`.
    pub fn label(self) -> &'static str {
        match self {
            TaxKind::Cgst => "CGST 9%",
            TaxKind::Sgst => "SGST 9%",
            TaxKind::Cess => "CESS 1%",
            TaxKind::Igst => "IGST 18%",
        }
    }
}

/// Which taxes are applied to the invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxSelection {
    pub cgst: bool,
    pub sgst: bool,
    pub cess: bool,
    pub igst: bool,
}

impl TaxSelection {
    pub fn is_enabled(&self, kind: TaxKind) -> bool {
        match kind {
            TaxKind::Cgst => self.cgst,
            TaxKind::Sgst => self.sgst,
            TaxKind::Cess => self.cess,
            TaxKind::Igst => self.igst,
        }
    }

    /// Return a copy with `kind` switched on or off.
    ///
    /// Switching IGST on clears CGST and SGST; switching CGST or SGST on
    /// clears IGST. Switching anything off leaves the other flags alone.
    pub fn toggled(mut self, kind: TaxKind, enabled: bool) -> Self {
        match kind {
            TaxKind::Cgst => self.cgst = enabled,
            TaxKind::Sgst => self.sgst = enabled,
            TaxKind::Cess => self.cess = enabled,
            TaxKind::Igst => self.igst = enabled,
        }
        if enabled {
            match kind {
                TaxKind::Igst => {
                    self.cgst = false;
                    self.sgst = false;
                }
                TaxKind::Cgst | TaxKind::Sgst => self.igst = false,
                TaxKind::Cess => {}
            }
        }
        self
    }
}

/// Subtotal, per-category tax amounts and grand total.
///
/// Values keep full precision; round only when displaying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub cess: Decimal,
    pub igst: Decimal,
    pub grand_total: Decimal,
}

impl InvoiceTotals {
    /// Amount levied for `kind` (zero when not selected).
    pub fn amount(&self, kind: TaxKind) -> Decimal {
        match kind {
            TaxKind::Cgst => self.cgst,
            TaxKind::Sgst => self.sgst,
            TaxKind::Cess => self.cess,
            TaxKind::Igst => self.igst,
        }
    }
}

/// Compute the per-category taxes and grand total for `subtotal`.
///
/// A negative subtotal is treated as zero. Figures too large to represent
/// saturate at [`Decimal::MAX`].
pub fn compute_totals(subtotal: Decimal, selection: &TaxSelection) -> InvoiceTotals {
    let subtotal = subtotal.max(Decimal::ZERO);
    let levy = |kind: TaxKind| {
        if selection.is_enabled(kind) {
            subtotal.saturating_mul(kind.rate())
        } else {
            Decimal::ZERO
        }
    };

    let cgst = levy(TaxKind::Cgst);
    let sgst = levy(TaxKind::Sgst);
    let cess = levy(TaxKind::Cess);
    let igst = levy(TaxKind::Igst);

    InvoiceTotals {
        subtotal,
        cgst,
        sgst,
        cess,
        igst,
        grand_total: [cgst, sgst, cess, igst]
            .into_iter()
            .fold(subtotal, Decimal::saturating_add),
    }
}
