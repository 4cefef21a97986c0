//! Axum handlers for the payment API and processor webhook endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::handlers::payment::{
    CancelOutcome, CancelPaymentCommand, CancelPaymentHandler, CaptureOutcome,
    CapturePaymentCommand, CapturePaymentHandler, ChargeOrderCommand, ChargeOrderHandler,
    ChargeOrderOutcome, InstantSettleHandler, RefundOutcome, RefundPaymentCommand,
    RefundPaymentHandler,
};
use crate::application::handlers::subscription::{ChargeRenewalCommand, ChargeRenewalHandler};
use crate::application::handlers::webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookOutcome,
};
use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::settlement::SettlePolicy;
use crate::domain::webhook::WebhookVerifier;
use crate::ports::{EngineHooks, OrderLock, OrderStore, ProcessorClient};

use super::dto::{
    CapturePaymentRequest, ChargeOrderRequest, ErrorResponse, PaymentActionResponse,
    RefundPaymentRequest,
};

/// Shared application state for the payment routes.
///
/// Holds the ports and settlement configuration; handlers are constructed
/// on demand per request.
#[derive(Clone)]
pub struct PaymentAppState {
    pub order_store: Arc<dyn OrderStore>,
    pub processor_client: Arc<dyn ProcessorClient>,
    pub order_lock: Arc<dyn OrderLock>,
    pub hooks: Arc<dyn EngineHooks>,
    pub webhook_verifier: WebhookVerifier,
    pub settle_policy: SettlePolicy,
    pub handle_failover: bool,
    pub skip_order_lines: bool,
}

impl PaymentAppState {
    fn instant_settle_handler(&self) -> Arc<InstantSettleHandler> {
        Arc::new(InstantSettleHandler::new(
            self.order_store.clone(),
            self.processor_client.clone(),
            self.settle_policy.clone(),
            self.skip_order_lines,
        ))
    }

    pub fn charge_handler(&self) -> Arc<ChargeOrderHandler> {
        Arc::new(ChargeOrderHandler::new(
            self.order_store.clone(),
            self.processor_client.clone(),
            self.settle_policy.clone(),
            self.instant_settle_handler(),
            self.handle_failover,
            self.skip_order_lines,
        ))
    }

    pub fn capture_handler(&self) -> CapturePaymentHandler {
        CapturePaymentHandler::new(self.order_store.clone(), self.processor_client.clone())
    }

    pub fn cancel_handler(&self) -> CancelPaymentHandler {
        CancelPaymentHandler::new(self.order_store.clone(), self.processor_client.clone())
    }

    pub fn refund_handler(&self) -> RefundPaymentHandler {
        RefundPaymentHandler::new(self.order_store.clone(), self.processor_client.clone())
    }

    pub fn renewal_handler(&self) -> ChargeRenewalHandler {
        ChargeRenewalHandler::new(
            self.order_store.clone(),
            self.processor_client.clone(),
            self.charge_handler(),
        )
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.order_store.clone(),
            self.processor_client.clone(),
            self.order_lock.clone(),
            self.hooks.clone(),
            self.webhook_verifier.clone(),
            self.instant_settle_handler(),
        )
    }
}

/// POST /webhooks/processor
///
/// Receives webhook notifications from the payment processor. Returns 2xx
/// once the event is applied (or recognized as a redelivery) so the
/// processor stops redelivering; 5xx asks for a retry.
pub async fn handle_processor_webhook(
    State(state): State<PaymentAppState>,
    body: Bytes,
) -> Response {
    let handler = state.webhook_handler();
    match handler
        .handle(ProcessWebhookCommand {
            payload: body.to_vec(),
        })
        .await
    {
        Ok(outcome) => {
            tracing::debug!(?outcome, "webhook processed");
            StatusCode::OK.into_response()
        }
        Err(error) => {
            tracing::warn!(%error, "webhook rejected");
            (
                error.status_code(),
                Json(ErrorResponse::new("WEBHOOK_ERROR", error.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /orders/:id/charge
pub async fn charge_order(
    State(state): State<PaymentAppState>,
    Path(order_id): Path<u64>,
    Json(request): Json<ChargeOrderRequest>,
) -> Response {
    let outcome = state
        .charge_handler()
        .handle(ChargeOrderCommand {
            order_id: OrderId::new(order_id),
            source: request.source,
        })
        .await;

    match outcome {
        Ok(outcome) => charge_response(outcome),
        Err(error) => domain_error_response(error),
    }
}

/// POST /orders/:id/charge-renewal
pub async fn charge_renewal(
    State(state): State<PaymentAppState>,
    Path(order_id): Path<u64>,
) -> Response {
    let outcome = state
        .renewal_handler()
        .handle(ChargeRenewalCommand {
            order_id: OrderId::new(order_id),
        })
        .await;

    match outcome {
        Ok(outcome) => charge_response(outcome),
        Err(error) => domain_error_response(error),
    }
}

/// POST /orders/:id/capture
pub async fn capture_payment(
    State(state): State<PaymentAppState>,
    Path(order_id): Path<u64>,
    Json(request): Json<CapturePaymentRequest>,
) -> Response {
    let outcome = state
        .capture_handler()
        .handle(CapturePaymentCommand {
            order_id: OrderId::new(order_id),
            amount: request.amount,
        })
        .await;

    match outcome {
        Ok(CaptureOutcome::Captured { amount }) => ok_response(
            PaymentActionResponse::outcome("captured").with_amount(amount),
        ),
        Ok(CaptureOutcome::AlreadySettled) => {
            ok_response(PaymentActionResponse::outcome("already_settled"))
        }
        Err(error) => domain_error_response(error),
    }
}

/// POST /orders/:id/cancel
pub async fn cancel_payment(
    State(state): State<PaymentAppState>,
    Path(order_id): Path<u64>,
) -> Response {
    let outcome = state
        .cancel_handler()
        .handle(CancelPaymentCommand {
            order_id: OrderId::new(order_id),
        })
        .await;

    match outcome {
        Ok(CancelOutcome::Cancelled) => ok_response(PaymentActionResponse::outcome("cancelled")),
        Ok(CancelOutcome::AlreadyCancelled) => {
            ok_response(PaymentActionResponse::outcome("already_cancelled"))
        }
        Err(error) => domain_error_response(error),
    }
}

/// POST /orders/:id/refund
pub async fn refund_payment(
    State(state): State<PaymentAppState>,
    Path(order_id): Path<u64>,
    Json(request): Json<RefundPaymentRequest>,
) -> Response {
    let outcome = state
        .refund_handler()
        .handle(RefundPaymentCommand {
            order_id: OrderId::new(order_id),
            amount: request.amount,
            reason: request.reason,
        })
        .await;

    match outcome {
        Ok(RefundOutcome::Refunded {
            credit_note_id,
            amount,
        }) => ok_response(
            PaymentActionResponse::outcome("refunded")
                .with_amount(amount)
                .with_credit_note(credit_note_id),
        ),
        Ok(RefundOutcome::AlreadyRecorded { credit_note_id }) => ok_response(
            PaymentActionResponse::outcome("already_recorded").with_credit_note(credit_note_id),
        ),
        Err(error) => domain_error_response(error),
    }
}

fn charge_response(outcome: ChargeOrderOutcome) -> Response {
    match outcome {
        ChargeOrderOutcome::Authorized { amount } => ok_response(
            PaymentActionResponse::outcome("authorized").with_amount(amount),
        ),
        ChargeOrderOutcome::Settled { amount } => ok_response(
            PaymentActionResponse::outcome("settled").with_amount(amount),
        ),
        ChargeOrderOutcome::AlreadyCharged => {
            ok_response(PaymentActionResponse::outcome("already_charged"))
        }
    }
}

fn ok_response(body: PaymentActionResponse) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// Maps domain errors to HTTP responses.
fn domain_error_response(error: DomainError) -> Response {
    let status = match error.code {
        ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::OrderNotFound | ErrorCode::InvoiceNotFound | ErrorCode::TokenNotFound => {
            StatusCode::NOT_FOUND
        }
        ErrorCode::InvalidStateTransition
        | ErrorCode::CaptureNotAllowed
        | ErrorCode::CancelNotAllowed
        | ErrorCode::RefundNotAllowed => StatusCode::CONFLICT,
        ErrorCode::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::StorageError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::ExternalServiceError => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!(%error, "payment action failed");
    } else {
        tracing::warn!(%error, "payment action rejected");
    }

    (
        status,
        Json(ErrorResponse::new(error.code.to_string(), error.message)),
    )
        .into_response()
}
