//! Local order record.
//!
//! The order itself is owned by the host platform; this engine reads totals,
//! currency and lines, and writes the payment metadata block. Everything the
//! engine persists lives under [`PaymentMeta`] so the host can map it onto
//! whatever per-order metadata store it uses.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerHandle, OrderId};
use crate::domain::invoice::InvoiceHandle;

use super::{OrderLine, OrderPaymentStatus};

/// Payment metadata written by this engine onto the order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMeta {
    pub status: OrderPaymentStatus,

    /// Current processor invoice handle. Exactly one at a time; stale
    /// handles are discarded after a collision, never reused.
    pub invoice_handle: Option<InvoiceHandle>,

    /// Transaction id recorded at authorization.
    pub transaction_id: Option<String>,

    /// Transaction id of the latest capture.
    pub capture_transaction_id: Option<String>,

    /// Transaction id of the cancellation.
    pub cancel_transaction_id: Option<String>,

    /// Credit-note ids of refunds already applied locally.
    pub credit_note_ids: Vec<String>,

    /// Order line ids whose amounts have already been settled.
    pub settled_line_ids: Vec<String>,

    /// Set when the order was cancelled from the store side.
    pub cancelled_locally: bool,

    /// Guard so inventory is reduced exactly once.
    pub stock_reduced: bool,

    /// Reconciliation lock flag; see the OrderLock port.
    pub locked: bool,

    /// Stored card-on-file token for renewal charges.
    pub payment_token: Option<String>,

    /// Short-lived operator-visible message from the last failed action.
    pub last_action_error: Option<String>,
}

impl Default for PaymentMeta {
    fn default() -> Self {
        Self {
            status: OrderPaymentStatus::Pending,
            invoice_handle: None,
            transaction_id: None,
            capture_transaction_id: None,
            cancel_transaction_id: None,
            credit_note_ids: Vec::new(),
            settled_line_ids: Vec::new(),
            cancelled_locally: false,
            stock_reduced: false,
            locked: false,
            payment_token: None,
            last_action_error: None,
        }
    }
}

/// Snapshot of a host-platform order plus this engine's payment metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,

    pub customer: CustomerHandle,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Order grand total in minor units.
    pub total_amount: i64,

    pub lines: Vec<OrderLine>,

    /// Shipping total excluding tax, minor units.
    pub shipping_total: i64,

    /// Tax on shipping, minor units.
    pub shipping_tax: i64,

    /// Total order discount including tax, minor units.
    pub discount_total: i64,

    pub payment: PaymentMeta,
}

impl OrderRecord {
    pub fn new(
        id: OrderId,
        customer: CustomerHandle,
        currency: impl Into<String>,
        total_amount: i64,
        lines: Vec<OrderLine>,
    ) -> Self {
        Self {
            id,
            customer,
            currency: currency.into(),
            total_amount,
            lines,
            shipping_total: 0,
            shipping_tax: 0,
            discount_total: 0,
            payment: PaymentMeta::default(),
        }
    }

    /// The handle currently associated with this order, if any.
    pub fn invoice_handle(&self) -> Option<&InvoiceHandle> {
        self.payment.invoice_handle.as_ref()
    }

    /// Sum of line totals already settled, minor units.
    pub fn settled_lines_total(&self) -> i64 {
        self.lines
            .iter()
            .filter(|line| self.payment.settled_line_ids.contains(&line.id))
            .map(|line| line.total())
            .sum()
    }

    /// Marks lines as settled, skipping ids already recorded.
    pub fn mark_lines_settled(&mut self, line_ids: &[String]) {
        for id in line_ids {
            if !self.payment.settled_line_ids.contains(id) {
                self.payment.settled_line_ids.push(id.clone());
            }
        }
    }

    /// Records a credit note id; returns false if it was already known.
    pub fn record_credit_note(&mut self, credit_note_id: &str) -> bool {
        if self
            .payment
            .credit_note_ids
            .iter()
            .any(|id| id == credit_note_id)
        {
            return false;
        }
        self.payment.credit_note_ids.push(credit_note_id.to_string());
        true
    }
}
