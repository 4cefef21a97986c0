//! ProcessorClient port - typed surface over the payment processor API.
//!
//! Everything the engine needs from the processor goes through this trait:
//! charging, settling, cancelling, refunding, invoice lookup, webhook
//! configuration and recurring-payment sessions. Implementations must be
//! safe to share across concurrent requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::CustomerHandle;
use crate::domain::invoice::{Invoice, InvoiceHandle, InvoiceState};
use crate::domain::settlement::SettleLine;

use super::ProcessorError;

/// Request to create/charge a processor invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Idempotency handle for the invoice.
    pub handle: InvoiceHandle,

    pub customer: CustomerHandle,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Flat amount in minor units; used when order lines are skipped.
    pub amount: Option<i64>,

    /// Itemized order lines; empty when `amount` is used instead.
    pub order_lines: Vec<SettleLine>,

    /// Payment source: a stored card-on-file token or a one-time card
    /// token from the checkout session.
    pub source: String,

    /// Capture immediately instead of authorize-only.
    pub settle: bool,
}

/// Result of a charge call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResult {
    pub handle: String,
    pub state: InvoiceState,
    pub transaction: Option<String>,
    pub amount: i64,
}

/// Request to settle (capture) part or all of an authorized invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleRequest {
    /// Flat amount in minor units; used when order lines are skipped.
    pub amount: Option<i64>,

    /// Itemized lines to settle; empty when `amount` is used instead.
    pub order_lines: Vec<SettleLine>,

    /// Idempotency key for this settle call.
    pub key: Option<String>,
}

impl SettleRequest {
    /// Total amount this request asks to settle, minor units.
    pub fn requested_amount(&self) -> i64 {
        match self.amount {
            Some(amount) => amount,
            None => self.order_lines.iter().map(|line| line.total()).sum(),
        }
    }
}

/// Result of a settle call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleResult {
    pub state: InvoiceState,
    pub transaction: Option<String>,
    pub settled_amount: i64,
}

/// Result of a cancel call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResult {
    pub state: InvoiceState,
    pub transaction: Option<String>,
}

/// Request to refund a settled invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Invoice handle to refund against.
    pub invoice: String,

    /// Refund amount in minor units.
    pub amount: i64,

    /// Reason shown on the credit note.
    pub text: Option<String>,

    /// Idempotency key for this refund call.
    pub key: Option<String>,
}

/// Result of a refund call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResult {
    pub credit_note_id: String,
    pub state: InvoiceState,
    pub amount: i64,
}

/// Webhook endpoint configuration pushed to the processor account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    pub urls: Vec<String>,
    pub disabled: bool,
}

/// Request for a hosted charge session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeSessionRequest {
    pub handle: InvoiceHandle,
    pub customer: CustomerHandle,
    pub currency: String,
    pub amount: i64,
    pub accept_url: String,
    pub cancel_url: String,
}

/// A hosted session (charge or recurring) created at the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: String,
    pub url: Option<String>,
}

/// A stored payment method on a processor customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Token usable as a charge source.
    pub id: String,

    /// Processor state, e.g. "active", "inactivated", "failed".
    pub state: String,

    pub card_type: Option<String>,

    pub masked_card: Option<String>,
}

impl PaymentMethod {
    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

/// Port for the processor REST API.
#[async_trait]
pub trait ProcessorClient: Send + Sync {
    /// Create/charge an invoice under the given handle.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, ProcessorError>;

    /// Settle (capture) part or all of an authorized invoice.
    async fn settle(
        &self,
        handle: &InvoiceHandle,
        request: SettleRequest,
    ) -> Result<SettleResult, ProcessorError>;

    /// Cancel an authorized invoice.
    async fn cancel(&self, handle: &InvoiceHandle) -> Result<CancelResult, ProcessorError>;

    /// Refund against a settled invoice.
    async fn refund(&self, request: RefundRequest) -> Result<RefundResult, ProcessorError>;

    /// Fetch a fresh invoice snapshot. Never cached by callers.
    async fn get_invoice(&self, handle: &InvoiceHandle) -> Result<Invoice, ProcessorError>;

    /// Push webhook endpoint settings to the processor account.
    async fn configure_webhooks(&self, settings: WebhookSettings) -> Result<(), ProcessorError>;

    /// Create a hosted session that stores a card-on-file token.
    async fn create_recurring_session(
        &self,
        customer: &CustomerHandle,
    ) -> Result<SessionResult, ProcessorError>;

    /// Create a hosted charge session for a one-off payment.
    async fn create_charge_session(
        &self,
        request: ChargeSessionRequest,
    ) -> Result<SessionResult, ProcessorError>;

    /// List stored payment methods for a customer.
    async fn get_payment_methods(
        &self,
        customer: &CustomerHandle,
    ) -> Result<Vec<PaymentMethod>, ProcessorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn ProcessorClient) {}
    }

    #[test]
    fn settle_request_amount_prefers_flat_amount() {
        let request = SettleRequest {
            amount: Some(5000),
            order_lines: vec![],
            key: None,
        };
        assert_eq!(request.requested_amount(), 5000);
    }

    #[test]
    fn settle_request_amount_sums_lines() {
        let request = SettleRequest {
            amount: None,
            order_lines: vec![
                SettleLine {
                    line_id: Some("a".to_string()),
                    description: "A".to_string(),
                    quantity: 2,
                    unit_amount: 1000,
                    vat_rate: rust_decimal::Decimal::ZERO,
                    amount_includes_vat: true,
                },
                SettleLine {
                    line_id: None,
                    description: "Shipping".to_string(),
                    quantity: 1,
                    unit_amount: 500,
                    vat_rate: rust_decimal::Decimal::ZERO,
                    amount_includes_vat: true,
                },
            ],
            key: None,
        };
        assert_eq!(request.requested_amount(), 2500);
    }

    #[test]
    fn payment_method_active_state() {
        let method = PaymentMethod {
            id: "pm-1".to_string(),
            state: "active".to_string(),
            card_type: None,
            masked_card: None,
        };
        assert!(method.is_active());

        let inactive = PaymentMethod {
            state: "inactivated".to_string(),
            ..method
        };
        assert!(!inactive.is_active());
    }
}
