//! Webhook error types.
//!
//! Defines all error conditions that can occur during webhook
//! reconciliation, with HTTP status code mapping and retryability
//! semantics. The processor retries on non-2xx responses, so only
//! transient failures map to 5xx.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Failed to parse the webhook payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The invoice handle does not map to a local order. Acknowledged,
    /// not retried: the order may belong to another system.
    #[error("No order for invoice handle {0}")]
    UnknownHandle(String),

    /// The per-order reconciliation lock could not be acquired in time.
    #[error("Timed out waiting for order lock")]
    LockTimeout,

    /// Attempted state transition is not valid.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Processor API call during reconciliation failed.
    #[error("Processor error: {0}")]
    Processor(String),

    /// Order store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Returns true if the processor should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::LockTimeout | WebhookError::Processor(_) | WebhookError::Storage(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Status codes determine the processor's retry behavior:
    /// - 2xx: acknowledged, no retry
    /// - 4xx: rejected, no retry
    /// - 5xx: will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,

            WebhookError::ParseError(_) | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            // Unknown handles are logged and acknowledged so the
            // processor does not keep redelivering.
            WebhookError::UnknownHandle(_) => StatusCode::OK,

            WebhookError::LockTimeout
            | WebhookError::InvalidTransition(_)
            | WebhookError::Processor(_)
            | WebhookError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
