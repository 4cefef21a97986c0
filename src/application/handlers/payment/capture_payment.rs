//! CapturePaymentHandler - settles part or all of an authorized payment.
//!
//! The fresh invoice snapshot is the source of truth for eligibility. Two
//! processor rejections get special treatment: "already settled" collapses
//! to an idempotent success, and "settle amount too high" triggers a single
//! retry for whatever authorization remains.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::invoice::InvoiceHandle;
use crate::domain::order::{OrderPaymentStatus, OrderRecord};
use crate::ports::{ApiErrorCode, OrderStore, ProcessorClient, SettleRequest, SettleResult};

use super::apply_invoice_state::apply_invoice_state;

/// Command to capture an authorized payment.
#[derive(Debug, Clone)]
pub struct CapturePaymentCommand {
    pub order_id: OrderId,

    /// Amount in minor units; `None` captures the remaining authorization.
    pub amount: Option<i64>,
}

/// Result of a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The processor settled the given amount (minor units).
    Captured { amount: i64 },

    /// The invoice was already fully settled; local state was synced.
    AlreadySettled,
}

/// Handler for capture requests.
pub struct CapturePaymentHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
}

impl CapturePaymentHandler {
    pub fn new(store: Arc<dyn OrderStore>, client: Arc<dyn ProcessorClient>) -> Self {
        Self { store, client }
    }

    pub async fn handle(&self, cmd: CapturePaymentCommand) -> Result<CaptureOutcome, DomainError> {
        let mut order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(cmd.order_id))?;

        let handle = order.invoice_handle().cloned().ok_or_else(|| {
            DomainError::new(ErrorCode::CaptureNotAllowed, "Order has no invoice")
        })?;

        // Always decide on a fresh snapshot; never on cached local state.
        let invoice = self
            .client
            .get_invoice(&handle)
            .await
            .map_err(|e| self.external(&order, "Invoice fetch failed", e))?;

        let amount = cmd
            .amount
            .unwrap_or_else(|| invoice.remaining_authorized_amount());
        if amount <= 0 || !invoice.can_capture(amount) {
            if invoice.remaining_authorized_amount() == 0
                && invoice.state == crate::domain::invoice::InvoiceState::Settled
            {
                self.sync_settled(&mut order, None).await?;
                return Ok(CaptureOutcome::AlreadySettled);
            }
            return Err(DomainError::new(
                ErrorCode::CaptureNotAllowed,
                format!(
                    "Cannot capture {} {} in invoice state {}",
                    amount,
                    invoice.currency,
                    invoice.state.as_str()
                ),
            ));
        }

        let result = match self.settle_once(&handle, amount).await {
            Ok(result) => result,
            Err(error) if error.is_api_code(ApiErrorCode::InvoiceAlreadySettled) => {
                self.sync_settled(&mut order, None).await?;
                return Ok(CaptureOutcome::AlreadySettled);
            }
            Err(error) if error.is_api_code(ApiErrorCode::SettleAmountTooHigh) => {
                // Another capture raced us; retry once for the remainder.
                let fresh = self
                    .client
                    .get_invoice(&handle)
                    .await
                    .map_err(|e| self.external(&order, "Invoice fetch failed", e))?;
                let remainder = fresh.remaining_authorized_amount();
                if remainder == 0 {
                    self.sync_settled(&mut order, None).await?;
                    return Ok(CaptureOutcome::AlreadySettled);
                }
                tracing::warn!(
                    order_id = %order.id,
                    requested = amount,
                    remainder,
                    "settle amount too high, retrying with remainder"
                );
                self.settle_once(&handle, remainder)
                    .await
                    .map_err(|e| self.external(&order, "Capture failed", e))?
            }
            Err(error) => {
                self.record_failure(&order, &error.to_string()).await;
                return Err(DomainError::new(
                    ErrorCode::ExternalServiceError,
                    format!("Capture failed: {}", error),
                ));
            }
        };

        let captured = result.settled_amount;
        self.sync_settled(&mut order, result.transaction.as_deref())
            .await?;
        self.store
            .add_note(
                order.id,
                &format!("Captured {} {}", captured, order.currency),
            )
            .await?;

        tracing::info!(order_id = %order.id, amount = captured, "capture completed");
        Ok(CaptureOutcome::Captured { amount: captured })
    }

    async fn settle_once(
        &self,
        handle: &InvoiceHandle,
        amount: i64,
    ) -> Result<SettleResult, crate::ports::ProcessorError> {
        self.client
            .settle(
                handle,
                SettleRequest {
                    amount: Some(amount),
                    order_lines: vec![],
                    key: Some(format!("capture-{}-{}", handle, amount)),
                },
            )
            .await
    }

    async fn sync_settled(
        &self,
        order: &mut OrderRecord,
        transaction: Option<&str>,
    ) -> Result<(), DomainError> {
        apply_invoice_state(order, OrderPaymentStatus::Settled, transaction);
        self.store.save_order(order).await
    }

    fn external(
        &self,
        order: &OrderRecord,
        context: &str,
        error: crate::ports::ProcessorError,
    ) -> DomainError {
        tracing::error!(order_id = %order.id, error = %error, "{}", context);
        DomainError::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", context, error),
        )
    }

    async fn record_failure(&self, order: &OrderRecord, message: &str) {
        if let Err(store_error) = self.store.set_last_action_error(order.id, message).await {
            tracing::warn!(order_id = %order.id, error = %store_error, "could not record action error");
        }
    }
}
