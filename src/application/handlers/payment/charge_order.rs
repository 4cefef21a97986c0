//! ChargeOrderHandler - charges an order against a stored payment token.
//!
//! Creates (or reuses) the processor invoice under the order's handle,
//! applies the synchronous result to the order, and runs the instant-settle
//! step when only part of the order is eligible for immediate capture.
//!
//! # Handle failover
//!
//! When the processor rejects the handle because it is attached to an
//! invoice that can no longer serve this order, a unique handle
//! (`order-<id>-<unixtime>`) is generated and the charge retried exactly
//! once. The stale handle is discarded and never reused.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::invoice::InvoiceHandle;
use crate::domain::order::{OrderPaymentStatus, OrderRecord};
use crate::domain::settlement::{calculate_instant_settle, SettleLine, SettlePolicy};
use crate::ports::{
    ApiErrorCode, ChargeRequest, ChargeResult, OrderStore, ProcessorClient, ProcessorError,
};
use rust_decimal::Decimal;

use super::apply_invoice_state::apply_invoice_state;
use super::instant_settle::{InstantSettleCommand, InstantSettleHandler};

/// Command to charge an order.
#[derive(Debug, Clone)]
pub struct ChargeOrderCommand {
    pub order_id: OrderId,

    /// Payment source override; falls back to the order's stored token.
    pub source: Option<String>,
}

/// Result of charging an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOrderOutcome {
    /// Funds are held; capture happens later.
    Authorized { amount: i64 },

    /// The whole order was captured immediately.
    Settled { amount: i64 },

    /// The order already has an authorized or settled payment.
    AlreadyCharged,
}

/// Handler for charging orders.
pub struct ChargeOrderHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
    policy: SettlePolicy,
    instant_settle: Arc<InstantSettleHandler>,
    handle_failover: bool,
    skip_order_lines: bool,
}

impl ChargeOrderHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        client: Arc<dyn ProcessorClient>,
        policy: SettlePolicy,
        instant_settle: Arc<InstantSettleHandler>,
        handle_failover: bool,
        skip_order_lines: bool,
    ) -> Self {
        Self {
            store,
            client,
            policy,
            instant_settle,
            handle_failover,
            skip_order_lines,
        }
    }

    pub async fn handle(&self, cmd: ChargeOrderCommand) -> Result<ChargeOrderOutcome, DomainError> {
        let mut order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(cmd.order_id))?;

        if matches!(
            order.payment.status,
            OrderPaymentStatus::Authorized | OrderPaymentStatus::Settled
        ) {
            return Ok(ChargeOrderOutcome::AlreadyCharged);
        }

        let source = cmd
            .source
            .or_else(|| order.payment.payment_token.clone())
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TokenNotFound,
                    format!("Order {} has no payment token", order.id),
                )
            })?;

        // The whole order can settle at charge time only when every part of
        // it matches the policy; otherwise authorize now, settle the
        // eligible part right after.
        let calc = calculate_instant_settle(&order, &self.policy);
        let settle_all = calc.would_settle && calc.amount >= order.total_amount;

        let handle = order
            .invoice_handle()
            .cloned()
            .unwrap_or_else(|| InvoiceHandle::base(order.id));

        let (handle, result) = self
            .charge_with_failover(&order, handle, &source, settle_all)
            .await;

        if let Err(error) = &result {
            // Declines mark the order failed; transport faults leave it
            // pending for a retry.
            if matches!(
                error.api_code(),
                Some(
                    ApiErrorCode::TransactionDeclined
                        | ApiErrorCode::CardExpired
                        | ApiErrorCode::InsufficientFunds
                )
            ) {
                apply_invoice_state(&mut order, OrderPaymentStatus::Failed, None);
                order.payment.invoice_handle = Some(handle.clone());
                self.store.save_order(&order).await?;
            }
        }
        let result = match result {
            Ok(result) => result,
            Err(error) => return Err(self.charge_failed(&order, error).await),
        };

        order.payment.invoice_handle = Some(handle);
        order.payment.payment_token = Some(source);

        let status = OrderPaymentStatus::from_invoice_state(result.state);
        apply_invoice_state(&mut order, status, result.transaction.as_deref());
        self.store.save_order(&order).await?;
        self.store
            .add_note(
                order.id,
                &format!(
                    "Charged {} {} ({})",
                    result.amount,
                    order.currency,
                    status.as_str()
                ),
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            handle = %result.handle,
            status = status.as_str(),
            amount = result.amount,
            "charge completed"
        );

        match status {
            OrderPaymentStatus::Settled => Ok(ChargeOrderOutcome::Settled {
                amount: result.amount,
            }),
            OrderPaymentStatus::Authorized => {
                if calc.would_settle && !settle_all {
                    self.instant_settle
                        .handle(InstantSettleCommand { order_id: order.id })
                        .await?;
                }
                Ok(ChargeOrderOutcome::Authorized {
                    amount: result.amount,
                })
            }
            other => Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Charge left invoice in state {}", other.as_str()),
            )),
        }
    }

    /// Attempts the charge, regenerating the handle once on a collision.
    ///
    /// Returns the handle actually used so the caller can persist it. The
    /// inner `Result` carries non-collision charge errors, which still need
    /// the handle for failure bookkeeping.
    async fn charge_with_failover(
        &self,
        order: &OrderRecord,
        handle: InvoiceHandle,
        source: &str,
        settle: bool,
    ) -> (InvoiceHandle, Result<ChargeResult, ProcessorError>) {
        let request = self.build_request(order, handle.clone(), source, settle);
        match self.client.charge(request).await {
            Err(error) if error.is_handle_collision() && self.handle_failover => {
                let fresh = InvoiceHandle::unique(order.id);
                tracing::warn!(
                    order_id = %order.id,
                    stale_handle = %handle,
                    fresh_handle = %fresh,
                    "invoice handle collision, retrying with fresh handle"
                );
                let retry = self.build_request(order, fresh.clone(), source, settle);
                (fresh, self.client.charge(retry).await)
            }
            other => (handle, other),
        }
    }

    fn build_request(
        &self,
        order: &OrderRecord,
        handle: InvoiceHandle,
        source: &str,
        settle: bool,
    ) -> ChargeRequest {
        // Order-level discounts cannot be expressed as invoice lines, and a
        // line-less order has nothing to itemize; both charge a flat amount.
        let use_flat =
            self.skip_order_lines || order.discount_total > 0 || order.lines.is_empty();
        let (amount, order_lines) = if use_flat {
            (Some(order.total_amount), vec![])
        } else {
            (None, Self::full_order_lines(order))
        };

        ChargeRequest {
            handle,
            customer: order.customer.clone(),
            currency: order.currency.clone(),
            amount,
            order_lines,
            source: source.to_string(),
            settle,
        }
    }

    /// Every order line plus a synthetic shipping line, for the invoice.
    fn full_order_lines(order: &OrderRecord) -> Vec<SettleLine> {
        let mut lines: Vec<SettleLine> = order
            .lines
            .iter()
            .map(|line| SettleLine {
                line_id: Some(line.id.clone()),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_amount: line.unit_amount,
                vat_rate: line.vat_rate,
                amount_includes_vat: line.amount_includes_vat,
            })
            .collect();

        let shipping = order.shipping_total + order.shipping_tax;
        if shipping > 0 {
            lines.push(SettleLine {
                line_id: None,
                description: "Shipping".to_string(),
                quantity: 1,
                unit_amount: shipping,
                vat_rate: Decimal::ZERO,
                amount_includes_vat: true,
            });
        }
        lines
    }

    async fn charge_failed(&self, order: &OrderRecord, error: ProcessorError) -> DomainError {
        if let Err(store_error) = self
            .store
            .set_last_action_error(order.id, &error.to_string())
            .await
        {
            tracing::warn!(order_id = %order.id, error = %store_error, "could not record action error");
        }

        tracing::error!(order_id = %order.id, error = %error, "charge failed");
        DomainError::new(
            ErrorCode::ExternalServiceError,
            format!("Charge failed: {}", error),
        )
    }
}
