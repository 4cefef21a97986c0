//! Route configuration for payment endpoints.
//!
//! Configures the Axum router for the processor webhook and the
//! order payment actions.

use axum::routing::post;
use axum::Router;

use super::handlers::{
    cancel_payment, capture_payment, charge_order, charge_renewal, handle_processor_webhook,
    refund_payment, PaymentAppState,
};

/// Creates the payment router with all endpoints.
///
/// Routes:
/// - `POST /webhooks/processor` - Processor webhook notifications
/// - `POST /orders/:id/charge` - Charge an order
/// - `POST /orders/:id/charge-renewal` - Charge a renewal order off-session
/// - `POST /orders/:id/capture` - Capture an authorized payment
/// - `POST /orders/:id/cancel` - Cancel an authorization
/// - `POST /orders/:id/refund` - Refund a settled payment
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .route("/webhooks/processor", post(handle_processor_webhook))
        .route("/orders/:id/charge", post(charge_order))
        .route("/orders/:id/charge-renewal", post(charge_renewal))
        .route("/orders/:id/capture", post(capture_payment))
        .route("/orders/:id/cancel", post(cancel_payment))
        .route("/orders/:id/refund", post(refund_payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderLock, InMemoryOrderStore, MockProcessorClient, NoopHooks,
    };
    use crate::domain::foundation::{CustomerHandle, OrderId};
    use crate::domain::order::OrderRecord;
    use crate::domain::settlement::SettlePolicy;
    use crate::domain::webhook::WebhookVerifier;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(store: Arc<InMemoryOrderStore>) -> PaymentAppState {
        PaymentAppState {
            order_store: store,
            processor_client: Arc::new(MockProcessorClient::new()),
            order_lock: Arc::new(InMemoryOrderLock::new()),
            hooks: Arc::new(NoopHooks),
            webhook_verifier: WebhookVerifier::new("whsec_test"),
            settle_policy: SettlePolicy::none(),
            handle_failover: true,
            skip_order_lines: false,
        }
    }

    fn seeded_store() -> Arc<InMemoryOrderStore> {
        let store = Arc::new(InMemoryOrderStore::new());
        let mut order = OrderRecord::new(
            OrderId::new(7),
            CustomerHandle::new("cust-7").unwrap(),
            "DKK",
            12500,
            vec![],
        );
        order.payment.payment_token = Some("tok-7".to_string());
        store.insert_order(order);
        store
    }

    #[tokio::test]
    async fn payment_router_mounts_charge_endpoint() {
        let app = payment_router().with_state(test_state(seeded_store()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders/7/charge")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn payment_router_mounts_webhook_endpoint() {
        let app = payment_router().with_state(test_state(seeded_store()));

        // Unsigned payload is rejected, but the route itself resolves.
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/processor")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancel_without_invoice_conflicts() {
        let app = payment_router().with_state(test_state(seeded_store()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders/7/cancel")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
