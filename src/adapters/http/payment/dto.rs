//! Request/response DTOs for the payment HTTP API.

use serde::{Deserialize, Serialize};

/// Standard error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Body for `POST /orders/:id/charge`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChargeOrderRequest {
    /// Payment source override; defaults to the order's stored token.
    #[serde(default)]
    pub source: Option<String>,
}

/// Body for `POST /orders/:id/capture`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CapturePaymentRequest {
    /// Amount in minor units; omit to capture the remaining authorization.
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Body for `POST /orders/:id/refund`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundPaymentRequest {
    /// Amount in minor units.
    pub amount: i64,

    /// Reason shown on the credit note.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Uniform response for payment actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentActionResponse {
    /// What happened: "authorized", "settled", "captured",
    /// "already_settled", "cancelled", "refunded", ...
    pub outcome: String,

    /// Amount involved, minor units, when the action has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// Credit note id for refunds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_note_id: Option<String>,
}

impl PaymentActionResponse {
    pub fn outcome(outcome: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            amount: None,
            credit_note_id: None,
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_credit_note(mut self, id: impl Into<String>) -> Self {
        self.credit_note_id = Some(id.into());
        self
    }
}
