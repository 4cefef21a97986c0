//! Wire-level DTOs for the processor REST API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::invoice::InvoiceState;
use crate::domain::settlement::SettleLine;

/// Error body returned by the processor on 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Numeric API error code. Absent on plain HTTP errors.
    pub code: Option<u16>,

    /// Short machine-oriented error name.
    pub error: Option<String>,

    /// Human-readable message.
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn message_text(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_default()
    }
}

/// Order line as the processor API expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOrderLine {
    pub ordertext: String,
    pub amount: i64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat: Option<rust_decimal::Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_incl_vat: Option<bool>,
}

impl From<&SettleLine> for ApiOrderLine {
    fn from(line: &SettleLine) -> Self {
        Self {
            ordertext: line.description.clone(),
            amount: line.unit_amount,
            quantity: line.quantity,
            vat: Some(line.vat_rate),
            amount_incl_vat: Some(line.amount_includes_vat),
        }
    }
}

/// Charge request body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiChargeRequest {
    pub handle: String,
    pub customer: String,
    pub currency: String,
    pub source: String,
    pub settle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_lines: Vec<ApiOrderLine>,
}

/// Charge response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiChargeResponse {
    pub handle: String,
    pub state: InvoiceState,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub amount: i64,
}

/// Settle request body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSettleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_lines: Vec<ApiOrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Settle response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettleResponse {
    pub state: InvoiceState,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub settled_amount: i64,
}

/// Cancel response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCancelResponse {
    pub state: InvoiceState,
    #[serde(default)]
    pub transaction: Option<String>,
}

/// Refund request body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRefundRequest {
    pub invoice: String,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Refund response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRefundResponse {
    pub credit_note_id: String,
    pub state: InvoiceState,
    pub amount: i64,
}

/// Webhook settings body (request and response share the shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiWebhookSettings {
    pub urls: Vec<String>,
    pub disabled: bool,
}

/// Session creation request body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<ApiSessionOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

/// Order block inside a charge session request.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSessionOrder {
    pub handle: String,
    pub customer: String,
    pub currency: String,
    pub amount: i64,
}

/// Session creation response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSessionResponse {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// A stored payment method as returned by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPaymentMethod {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub card: Option<ApiCard>,
}

/// Card details nested in a payment method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCard {
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub masked_card: Option<String>,
}

/// Payment method list response, keyed by method kind.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPaymentMethodList {
    #[serde(default)]
    pub cards: Vec<ApiPaymentMethod>,

    /// Other method kinds, kept for forward compatibility.
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}
