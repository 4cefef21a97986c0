//! RefundPaymentHandler - refunds part or all of a settled payment.
//!
//! Each processor refund yields a credit note; credit-note ids already
//! recorded on the order are skipped, which makes replays (store-side
//! retries as well as refund webhooks) harmless.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::ports::{OrderStore, ProcessorClient, RefundRequest};

/// Command to refund a settled payment.
#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub order_id: OrderId,

    /// Refund amount in minor units.
    pub amount: i64,

    /// Reason shown on the credit note.
    pub reason: Option<String>,
}

/// Result of a refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    Refunded { credit_note_id: String, amount: i64 },

    /// The credit note was already recorded locally; nothing changed.
    AlreadyRecorded { credit_note_id: String },
}

/// Handler for refund requests.
pub struct RefundPaymentHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
}

impl RefundPaymentHandler {
    pub fn new(store: Arc<dyn OrderStore>, client: Arc<dyn ProcessorClient>) -> Self {
        Self { store, client }
    }

    pub async fn handle(&self, cmd: RefundPaymentCommand) -> Result<RefundOutcome, DomainError> {
        if cmd.amount <= 0 {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Refund amount must be positive, got {}", cmd.amount),
            ));
        }

        let mut order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(cmd.order_id))?;

        // A locally-cancelled order must not pay money back even if the
        // processor-side invoice is still settled.
        if order.payment.cancelled_locally {
            return Err(DomainError::new(
                ErrorCode::RefundNotAllowed,
                "Order is cancelled locally",
            ));
        }

        let handle = order
            .invoice_handle()
            .cloned()
            .ok_or_else(|| DomainError::new(ErrorCode::RefundNotAllowed, "Order has no invoice"))?;

        let invoice = self.client.get_invoice(&handle).await.map_err(|e| {
            DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Invoice fetch failed: {}", e),
            )
        })?;

        if !invoice.can_refund() {
            return Err(DomainError::new(
                ErrorCode::RefundNotAllowed,
                format!("Cannot refund invoice in state {}", invoice.state.as_str()),
            ));
        }
        let refundable = invoice.settled_amount - invoice.refunded_amount;
        if cmd.amount > refundable {
            return Err(DomainError::new(
                ErrorCode::RefundNotAllowed,
                format!(
                    "Refund of {} exceeds refundable amount {}",
                    cmd.amount, refundable
                ),
            )
            .with_detail("refundable", refundable.to_string()));
        }

        let result = match self
            .client
            .refund(RefundRequest {
                invoice: handle.as_str().to_string(),
                amount: cmd.amount,
                text: cmd.reason,
                key: Some(format!(
                    "refund-{}-{}",
                    handle,
                    invoice.credit_notes.len() + 1
                )),
            })
            .await
        {
            Ok(result) => result,
            Err(error) => {
                if let Err(store_error) = self
                    .store
                    .set_last_action_error(order.id, &error.to_string())
                    .await
                {
                    tracing::warn!(order_id = %order.id, error = %store_error, "could not record action error");
                }
                return Err(DomainError::new(
                    ErrorCode::ExternalServiceError,
                    format!("Refund failed: {}", error),
                ));
            }
        };

        if !order.record_credit_note(&result.credit_note_id) {
            return Ok(RefundOutcome::AlreadyRecorded {
                credit_note_id: result.credit_note_id,
            });
        }

        self.store.save_order(&order).await?;
        self.store
            .add_note(
                order.id,
                &format!(
                    "Refunded {} {} (credit note {})",
                    result.amount, order.currency, result.credit_note_id
                ),
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            amount = result.amount,
            credit_note = %result.credit_note_id,
            "refund completed"
        );
        Ok(RefundOutcome::Refunded {
            credit_note_id: result.credit_note_id,
            amount: result.amount,
        })
    }
}
