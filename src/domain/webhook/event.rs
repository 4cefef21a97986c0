//! Inbound webhook notification model.
//!
//! The processor pushes small JSON notifications; anything beyond the event
//! envelope (fresh amounts, order lines, credit notes) is re-fetched from
//! the invoice endpoint during reconciliation.

use serde::{Deserialize, Serialize};

use super::WebhookError;

/// Event types the reconciler understands.
///
/// Unknown types are carried verbatim in `Unhandled` and dispatched to the
/// extension point instead of being dropped, so future processor event
/// types do not require engine changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    InvoiceCreated,
    InvoiceAuthorized,
    InvoiceSettled,
    InvoiceCancelled,
    InvoiceFailed,
    InvoiceRefund,
    Unhandled(String),
}

impl WebhookEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "invoice_created" => WebhookEventType::InvoiceCreated,
            "invoice_authorized" => WebhookEventType::InvoiceAuthorized,
            "invoice_settled" => WebhookEventType::InvoiceSettled,
            "invoice_cancelled" => WebhookEventType::InvoiceCancelled,
            "invoice_failed" => WebhookEventType::InvoiceFailed,
            "invoice_refund" => WebhookEventType::InvoiceRefund,
            other => WebhookEventType::Unhandled(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::InvoiceCreated => "invoice_created",
            WebhookEventType::InvoiceAuthorized => "invoice_authorized",
            WebhookEventType::InvoiceSettled => "invoice_settled",
            WebhookEventType::InvoiceCancelled => "invoice_cancelled",
            WebhookEventType::InvoiceFailed => "invoice_failed",
            WebhookEventType::InvoiceRefund => "invoice_refund",
            WebhookEventType::Unhandled(s) => s,
        }
    }
}

/// A webhook notification as delivered by the processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookNotification {
    /// Processor event id; part of the signed payload.
    pub id: String,

    pub event_type: String,

    /// Invoice handle the event refers to.
    #[serde(default)]
    pub invoice: Option<String>,

    /// Transaction id, present on authorize/settle/cancel events.
    #[serde(default)]
    pub transaction: Option<String>,

    /// Credit note id, present on refund events.
    #[serde(default)]
    pub credit_note: Option<String>,

    /// Processor customer handle.
    #[serde(default)]
    pub customer: Option<String>,

    /// Signature timestamp string exactly as signed.
    pub timestamp: String,

    /// hex(HMAC-SHA256(timestamp + id, webhook_secret)).
    pub signature: String,
}

impl WebhookNotification {
    /// Parses the raw request body.
    pub fn from_bytes(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body)
            .map_err(|e| WebhookError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn parsed_type(&self) -> WebhookEventType {
        WebhookEventType::parse(&self.event_type)
    }

    /// The invoice handle, required for every invoice_* event.
    pub fn invoice_handle(&self) -> Result<&str, WebhookError> {
        self.invoice
            .as_deref()
            .ok_or(WebhookError::MissingField("invoice"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_event_types() {
        assert_eq!(
            WebhookEventType::parse("invoice_settled"),
            WebhookEventType::InvoiceSettled
        );
        assert_eq!(
            WebhookEventType::parse("invoice_refund"),
            WebhookEventType::InvoiceRefund
        );
    }

    #[test]
    fn unknown_event_type_is_carried_verbatim() {
        let parsed = WebhookEventType::parse("customer_payment_method_added");
        assert_eq!(
            parsed,
            WebhookEventType::Unhandled("customer_payment_method_added".to_string())
        );
        assert_eq!(parsed.as_str(), "customer_payment_method_added");
    }

    #[test]
    fn notification_parses_from_json() {
        let body = br#"{
            "id": "evt-001",
            "event_type": "invoice_authorized",
            "invoice": "order-42",
            "transaction": "txn-9",
            "timestamp": "2024-01-01T00:00:00.000+00:00",
            "signature": "deadbeef"
        }"#;

        let notification = WebhookNotification::from_bytes(body).unwrap();

        assert_eq!(notification.id, "evt-001");
        assert_eq!(notification.parsed_type(), WebhookEventType::InvoiceAuthorized);
        assert_eq!(notification.invoice_handle().unwrap(), "order-42");
        assert_eq!(notification.credit_note, None);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let result = WebhookNotification::from_bytes(b"not json");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn missing_invoice_handle_is_reported() {
        let body = br#"{
            "id": "evt-002",
            "event_type": "invoice_settled",
            "timestamp": "t",
            "signature": "s"
        }"#;
        let notification = WebhookNotification::from_bytes(body).unwrap();
        assert!(matches!(
            notification.invoice_handle(),
            Err(WebhookError::MissingField("invoice"))
        ));
    }
}
