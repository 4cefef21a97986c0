//! Order lines as seen by the settlement engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of an order line, used by the settle policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCategory {
    /// Goods that ship.
    Physical,

    /// Virtual or downloadable goods.
    Virtual,

    /// Recurring/subscription product lines.
    Recurring,

    /// Fee lines (payment fees, handling fees).
    Fee,
}

impl LineCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineCategory::Physical => "physical",
            LineCategory::Virtual => "virtual",
            LineCategory::Recurring => "recurring",
            LineCategory::Fee => "fee",
        }
    }
}

/// A line item on a local order.
///
/// `unit_amount` is always in the processor's minor currency unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Host platform line id, used to track per-line settlement.
    pub id: String,

    pub description: String,

    pub quantity: u32,

    /// Unit amount in minor units.
    pub unit_amount: i64,

    /// VAT rate as a fraction (e.g. 0.25 for 25%).
    pub vat_rate: Decimal,

    /// Whether `unit_amount` already includes VAT.
    pub amount_includes_vat: bool,

    pub category: LineCategory,
}

impl OrderLine {
    /// Total amount for the line in minor units.
    pub fn total(&self) -> i64 {
        self.unit_amount * i64::from(self.quantity)
    }
}
