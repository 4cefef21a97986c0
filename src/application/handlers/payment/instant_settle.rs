//! InstantSettleHandler - captures the policy-eligible part of an order
//! right after authorization.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::order::{OrderPaymentStatus, OrderRecord};
use crate::domain::settlement::{calculate_instant_settle, SettlePolicy};
use crate::ports::{ApiErrorCode, OrderStore, ProcessorClient, ProcessorError, SettleRequest};

use super::apply_invoice_state::apply_invoice_state;

/// Command to run the instant-settle step for an authorized order.
#[derive(Debug, Clone)]
pub struct InstantSettleCommand {
    pub order_id: OrderId,
}

/// Result of the instant-settle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstantSettleOutcome {
    /// A capture was performed for the given amount (minor units).
    Settled { amount: i64 },

    /// No line matched the policy, or the net amount was zero.
    NothingToSettle,

    /// Every eligible line was captured earlier; nothing changed.
    AlreadySettled,
}

/// Handler for the automatic post-authorization capture.
pub struct InstantSettleHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
    policy: SettlePolicy,
    skip_order_lines: bool,
}

impl InstantSettleHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        client: Arc<dyn ProcessorClient>,
        policy: SettlePolicy,
        skip_order_lines: bool,
    ) -> Self {
        Self {
            store,
            client,
            policy,
            skip_order_lines,
        }
    }

    pub async fn handle(
        &self,
        cmd: InstantSettleCommand,
    ) -> Result<InstantSettleOutcome, DomainError> {
        if self.policy.is_empty() {
            return Ok(InstantSettleOutcome::NothingToSettle);
        }

        let mut order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(cmd.order_id))?;

        if order.payment.status != OrderPaymentStatus::Authorized {
            return Ok(InstantSettleOutcome::NothingToSettle);
        }

        let handle = order
            .invoice_handle()
            .cloned()
            .ok_or_else(|| DomainError::new(ErrorCode::CaptureNotAllowed, "Order has no invoice"))?;

        let calc = calculate_instant_settle(&order, &self.policy);
        if !calc.would_settle || calc.amount <= 0 {
            return Ok(InstantSettleOutcome::NothingToSettle);
        }

        // Lines captured earlier (e.g. by a replayed charge path) are
        // deducted rather than re-sent.
        let pending_lines: Vec<_> = calc
            .lines
            .iter()
            .filter(|line| match &line.line_id {
                Some(id) => !order.payment.settled_line_ids.contains(id),
                None => true,
            })
            .cloned()
            .collect();
        if pending_lines.is_empty() {
            return Ok(InstantSettleOutcome::AlreadySettled);
        }

        let amount = (calc.amount - order.settled_lines_total()).max(0);
        if amount == 0 {
            return Ok(InstantSettleOutcome::AlreadySettled);
        }

        // Itemized lines cannot express the order-level discount, so any
        // discounted order falls back to a flat amount.
        let use_flat = self.skip_order_lines || order.discount_total > 0;
        let request = SettleRequest {
            amount: if use_flat { Some(amount) } else { None },
            order_lines: if use_flat { vec![] } else { pending_lines.clone() },
            key: Some(format!("instant-{}-{}", handle, amount)),
        };

        let result = match self.client.settle(&handle, request).await {
            Ok(result) => result,
            Err(error) if error.is_api_code(ApiErrorCode::InvoiceAlreadySettled) => {
                self.mark_settled(&mut order, None).await?;
                return Ok(InstantSettleOutcome::AlreadySettled);
            }
            Err(error) => {
                self.record_failure(&order, &error).await;
                return Err(DomainError::new(
                    ErrorCode::ExternalServiceError,
                    format!("Instant settle failed: {}", error),
                ));
            }
        };

        let line_ids: Vec<String> = pending_lines
            .iter()
            .filter_map(|line| line.line_id.clone())
            .collect();
        order.mark_lines_settled(&line_ids);
        self.mark_settled(&mut order, result.transaction.as_deref())
            .await?;

        self.store
            .add_note(
                order.id,
                &format!("Instant settle captured {} {}", amount, order.currency),
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            amount,
            currency = %order.currency,
            "instant settle captured"
        );
        Ok(InstantSettleOutcome::Settled { amount })
    }

    async fn mark_settled(
        &self,
        order: &mut OrderRecord,
        transaction: Option<&str>,
    ) -> Result<(), DomainError> {
        apply_invoice_state(order, OrderPaymentStatus::Settled, transaction);
        self.store.save_order(order).await
    }

    async fn record_failure(&self, order: &OrderRecord, error: &ProcessorError) {
        if let Err(store_error) = self
            .store
            .set_last_action_error(order.id, &error.to_string())
            .await
        {
            tracing::warn!(order_id = %order.id, error = %store_error, "could not record action error");
        }
    }
}
