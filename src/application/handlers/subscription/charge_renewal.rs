//! ChargeRenewalHandler - charges a subscription renewal order.
//!
//! Renewal orders are charged off-session against a stored card token. The
//! token is resolved through a fallback chain: the token on the renewal
//! order itself, then the customer-level stored token, then the customer's
//! active payment methods at the processor.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::ports::{OrderStore, ProcessorClient};

use crate::application::handlers::payment::{
    ChargeOrderCommand, ChargeOrderHandler, ChargeOrderOutcome,
};

/// Command to charge a renewal order.
#[derive(Debug, Clone)]
pub struct ChargeRenewalCommand {
    pub order_id: OrderId,
}

/// Handler for subscription renewal charges.
pub struct ChargeRenewalHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
    charge: Arc<ChargeOrderHandler>,
}

impl ChargeRenewalHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        client: Arc<dyn ProcessorClient>,
        charge: Arc<ChargeOrderHandler>,
    ) -> Self {
        Self {
            store,
            client,
            charge,
        }
    }

    pub async fn handle(
        &self,
        cmd: ChargeRenewalCommand,
    ) -> Result<ChargeOrderOutcome, DomainError> {
        let order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(cmd.order_id))?;

        let token = self.resolve_token(&order).await?;
        tracing::info!(order_id = %order.id, "charging renewal order");

        self.charge
            .handle(ChargeOrderCommand {
                order_id: order.id,
                source: Some(token),
            })
            .await
    }

    async fn resolve_token(
        &self,
        order: &crate::domain::order::OrderRecord,
    ) -> Result<String, DomainError> {
        if let Some(token) = &order.payment.payment_token {
            return Ok(token.clone());
        }

        if let Some(token) = self.store.find_customer_token(&order.customer).await? {
            tracing::debug!(order_id = %order.id, "using customer-level stored token");
            return Ok(token);
        }

        let methods = self
            .client
            .get_payment_methods(&order.customer)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::ExternalServiceError,
                    format!("Payment method lookup failed: {}", e),
                )
            })?;
        if let Some(method) = methods.iter().find(|m| m.is_active()) {
            tracing::debug!(order_id = %order.id, "using processor-side active payment method");
            return Ok(method.id.clone());
        }

        Err(DomainError::new(
            ErrorCode::TokenNotFound,
            format!(
                "No usable payment token for customer {}",
                order.customer.as_str()
            ),
        ))
    }
}
