//! CancelPaymentHandler - voids an authorized payment.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::order::OrderPaymentStatus;
use crate::ports::{ApiErrorCode, OrderStore, ProcessorClient};

use super::apply_invoice_state::apply_invoice_state;

/// Command to cancel an order's payment.
#[derive(Debug, Clone)]
pub struct CancelPaymentCommand {
    pub order_id: OrderId,
}

/// Result of a cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,

    /// The invoice was already cancelled; local state was synced.
    AlreadyCancelled,
}

/// Handler for cancel requests.
pub struct CancelPaymentHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
}

impl CancelPaymentHandler {
    pub fn new(store: Arc<dyn OrderStore>, client: Arc<dyn ProcessorClient>) -> Self {
        Self { store, client }
    }

    pub async fn handle(&self, cmd: CancelPaymentCommand) -> Result<CancelOutcome, DomainError> {
        let mut order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(cmd.order_id))?;

        if order.payment.status == OrderPaymentStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let handle = order
            .invoice_handle()
            .cloned()
            .ok_or_else(|| DomainError::new(ErrorCode::CancelNotAllowed, "Order has no invoice"))?;

        let invoice = self.client.get_invoice(&handle).await.map_err(|e| {
            DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Invoice fetch failed: {}", e),
            )
        })?;

        if !invoice.can_cancel() {
            return Err(DomainError::new(
                ErrorCode::CancelNotAllowed,
                format!("Cannot cancel invoice in state {}", invoice.state.as_str()),
            ));
        }

        let transaction = match self.client.cancel(&handle).await {
            Ok(result) => result.transaction,
            Err(error) if error.is_api_code(ApiErrorCode::InvoiceAlreadyCancelled) => None,
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
                    format!("Cancel failed: {}", error),
                ));
            }
        };

        order.payment.cancelled_locally = true;
        apply_invoice_state(&mut order, OrderPaymentStatus::Cancelled, transaction.as_deref());
        self.store.save_order(&order).await?;
        self.store.add_note(order.id, "Payment cancelled").await?;

        tracing::info!(order_id = %order.id, "payment cancelled");
        Ok(CancelOutcome::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryOrderStore, MockProcessorClient};
    use crate::domain::foundation::CustomerHandle;
    use crate::domain::invoice::InvoiceHandle;
    use crate::domain::order::OrderRecord;
    use crate::ports::ChargeRequest;

    async fn fixture(
        settle: bool,
    ) -> (
        Arc<InMemoryOrderStore>,
        Arc<MockProcessorClient>,
        OrderRecord,
    ) {
        let store = Arc::new(InMemoryOrderStore::new());
        let mock = Arc::new(MockProcessorClient::new());
        let mut order = OrderRecord::new(
            OrderId::new(5),
            CustomerHandle::new("cust-5").unwrap(),
            "SEK",
            4000,
            vec![],
        );
        let handle = InvoiceHandle::base(order.id);
        mock.charge(ChargeRequest {
            handle: handle.clone(),
            customer: order.customer.clone(),
            currency: order.currency.clone(),
            amount: Some(4000),
            order_lines: vec![],
            source: "tok".to_string(),
            settle,
        })
        .await
        .unwrap();
        order.payment.invoice_handle = Some(handle);
        order.payment.status = if settle {
            OrderPaymentStatus::Settled
        } else {
            OrderPaymentStatus::Authorized
        };
        store.insert_order(order.clone());
        (store, mock, order)
    }

    #[tokio::test]
    async fn cancels_authorized_payment() {
        let (store, mock, order) = fixture(false).await;
        let handler = CancelPaymentHandler::new(store.clone(), mock.clone());

        let outcome = handler
            .handle(CancelPaymentCommand { order_id: order.id })
            .await
            .unwrap();

        assert_eq!(outcome, CancelOutcome::Cancelled);
        let saved = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Cancelled);
        assert!(saved.payment.cancelled_locally);
        assert!(saved.payment.cancel_transaction_id.is_some());
    }

    #[tokio::test]
    async fn cancelling_twice_is_a_no_op() {
        let (store, mock, order) = fixture(false).await;
        let handler = CancelPaymentHandler::new(store.clone(), mock.clone());

        handler
            .handle(CancelPaymentCommand { order_id: order.id })
            .await
            .unwrap();
        let outcome = handler
            .handle(CancelPaymentCommand { order_id: order.id })
            .await
            .unwrap();

        assert_eq!(outcome, CancelOutcome::AlreadyCancelled);
        assert_eq!(mock.calls().iter().filter(|c| *c == "cancel").count(), 1);
    }

    #[tokio::test]
    async fn settled_invoice_cannot_be_cancelled() {
        let (store, mock, order) = fixture(true).await;
        let handler = CancelPaymentHandler::new(store.clone(), mock.clone());

        let error = handler
            .handle(CancelPaymentCommand { order_id: order.id })
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::CancelNotAllowed);
    }
}
