//! Processor invoice snapshot.
//!
//! The invoice is owned by the processor and is the source of truth for
//! capture eligibility. It is always re-fetched before a decision is made;
//! snapshots are never cached across operations.

use serde::{Deserialize, Serialize};

use super::InvoiceState;

/// A line on a processor invoice.
///
/// Amounts are in the processor's minor currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Processor line id.
    pub id: String,

    /// Line text shown on the invoice.
    pub ordertext: String,

    pub quantity: u32,

    /// Unit amount in minor units.
    pub amount: i64,

    /// Line kind as reported by the processor (e.g. "plan", "surcharge_fee").
    #[serde(default)]
    pub origin: Option<String>,
}

impl InvoiceLine {
    /// Total amount for the line in minor units.
    pub fn total(&self) -> i64 {
        self.amount * i64::from(self.quantity)
    }

    /// True for surcharge/fee lines added by the processor post-hoc.
    pub fn is_surcharge_fee(&self) -> bool {
        self.origin.as_deref() == Some("surcharge_fee")
    }
}

/// A credit note issued against a settled invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: String,

    /// Refunded amount in minor units.
    pub amount: i64,
}

/// Snapshot of a processor-side invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Idempotency handle this invoice was created under.
    pub handle: String,

    pub state: InvoiceState,

    pub currency: String,

    /// Amount currently authorized, minor units.
    pub authorized_amount: i64,

    /// Amount settled so far, minor units.
    pub settled_amount: i64,

    /// Amount refunded so far, minor units.
    pub refunded_amount: i64,

    /// Latest transaction id on the invoice.
    pub transaction: Option<String>,

    #[serde(default)]
    pub order_lines: Vec<InvoiceLine>,

    #[serde(default)]
    pub credit_notes: Vec<CreditNote>,
}

impl Invoice {
    /// True iff `amount` (minor units) can still be captured.
    ///
    /// Capture is allowed while the invoice is authorized, or when it is
    /// already partially settled and the authorization still covers the
    /// settled total plus the requested amount.
    pub fn can_capture(&self, amount: i64) -> bool {
        match self.state {
            InvoiceState::Authorized => true,
            InvoiceState::Settled => self.authorized_amount >= self.settled_amount + amount,
            _ => false,
        }
    }

    /// True iff the invoice can be cancelled.
    ///
    /// Partial or void cancellation of a settled invoice is unsupported.
    pub fn can_cancel(&self) -> bool {
        self.state == InvoiceState::Authorized
    }

    /// True iff the invoice can be refunded.
    pub fn can_refund(&self) -> bool {
        self.state == InvoiceState::Settled
    }

    /// Amount still authorizable for settlement, minor units.
    pub fn remaining_authorized_amount(&self) -> i64 {
        (self.authorized_amount - self.settled_amount).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(state: InvoiceState, authorized: i64, settled: i64) -> Invoice {
        Invoice {
            handle: "order-1001".to_string(),
            state,
            currency: "DKK".to_string(),
            authorized_amount: authorized,
            settled_amount: settled,
            refunded_amount: 0,
            transaction: Some("txn-1".to_string()),
            order_lines: vec![],
            credit_notes: vec![],
        }
    }

    #[test]
    fn can_capture_when_authorized() {
        let inv = invoice(InvoiceState::Authorized, 10000, 0);
        assert!(inv.can_capture(6000));
    }

    #[test]
    fn can_capture_partial_within_authorization() {
        let inv = invoice(InvoiceState::Settled, 10000, 6000);
        assert!(inv.can_capture(4000));
        assert!(!inv.can_capture(5000)); // 60 + 50 > 100
    }

    #[test]
    fn cannot_capture_cancelled_invoice() {
        let inv = invoice(InvoiceState::Cancelled, 10000, 0);
        assert!(!inv.can_capture(1));
    }

    #[test]
    fn can_cancel_only_authorized() {
        assert!(invoice(InvoiceState::Authorized, 10000, 0).can_cancel());
        assert!(!invoice(InvoiceState::Settled, 10000, 10000).can_cancel());
        assert!(!invoice(InvoiceState::Pending, 10000, 0).can_cancel());
    }

    #[test]
    fn can_refund_only_settled() {
        assert!(invoice(InvoiceState::Settled, 10000, 10000).can_refund());
        assert!(!invoice(InvoiceState::Authorized, 10000, 0).can_refund());
    }

    #[test]
    fn remaining_authorized_amount_floors_at_zero() {
        let inv = invoice(InvoiceState::Settled, 10000, 12000);
        assert_eq!(inv.remaining_authorized_amount(), 0);
    }

    #[test]
    fn surcharge_fee_line_detected_by_origin() {
        let line = InvoiceLine {
            id: "ol-1".to_string(),
            ordertext: "Card surcharge".to_string(),
            quantity: 1,
            amount: 150,
            origin: Some("surcharge_fee".to_string()),
        };
        assert!(line.is_surcharge_fee());
        assert_eq!(line.total(), 150);
    }
}
