//! ProcessWebhookHandler - reconciles processor webhook notifications
//! against local orders.
//!
//! Verification happens before any lookup; the per-order lock is held only
//! while local state is applied; every apply is idempotent so redeliveries
//! and races collapse into no-ops.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::order::{LineCategory, OrderPaymentStatus, OrderRecord};
use crate::domain::order::OrderLine;
use crate::domain::webhook::{WebhookError, WebhookEventType, WebhookNotification, WebhookVerifier};
use crate::ports::{EngineHooks, OrderLock, OrderStore, ProcessorClient};
use rust_decimal::Decimal;

use crate::application::handlers::payment::{
    apply_invoice_state, ApplyOutcome, InstantSettleCommand, InstantSettleHandler,
};

/// Command carrying a raw webhook request body.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub payload: Vec<u8>,
}

/// Result of webhook reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessWebhookOutcome {
    /// The event changed local state.
    Applied(WebhookEventType),

    /// The event had already been applied; nothing changed.
    AlreadyApplied(WebhookEventType),

    /// The event was acknowledged without a state change.
    Acknowledged(WebhookEventType),

    /// The event type is not handled by the engine; it was dispatched to
    /// the extension hook.
    Unhandled(String),
}

/// Handler for processor webhook notifications.
pub struct ProcessWebhookHandler {
    store: Arc<dyn OrderStore>,
    client: Arc<dyn ProcessorClient>,
    lock: Arc<dyn OrderLock>,
    hooks: Arc<dyn EngineHooks>,
    verifier: WebhookVerifier,
    instant_settle: Arc<InstantSettleHandler>,
}

impl ProcessWebhookHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        client: Arc<dyn ProcessorClient>,
        lock: Arc<dyn OrderLock>,
        hooks: Arc<dyn EngineHooks>,
        verifier: WebhookVerifier,
        instant_settle: Arc<InstantSettleHandler>,
    ) -> Self {
        Self {
            store,
            client,
            lock,
            hooks,
            verifier,
            instant_settle,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookOutcome, WebhookError> {
        let notification = WebhookNotification::from_bytes(&cmd.payload)?;
        self.verifier.verify(&notification)?;

        let event_type = notification.parsed_type();
        if let WebhookEventType::Unhandled(name) = &event_type {
            tracing::info!(event_id = %notification.id, event_type = %name, "dispatching unhandled event");
            self.hooks.unhandled_event(&notification).await;
            return Ok(ProcessWebhookOutcome::Unhandled(name.clone()));
        }

        let handle = notification.invoice_handle()?;
        let mut order = self
            .store
            .find_by_handle(handle)
            .await
            .map_err(storage)?
            .ok_or_else(|| WebhookError::UnknownHandle(handle.to_string()))?;

        // If another process held the lock, it may have changed the order;
        // reconcile against a fresh read.
        let was_contended = self
            .lock
            .wait_for_unlock(order.id)
            .await
            .map_err(storage)?;
        if was_contended {
            order = self
                .store
                .get_order(order.id)
                .await
                .map_err(storage)?
                .ok_or_else(|| WebhookError::UnknownHandle(handle.to_string()))?;
        }

        self.lock.lock(order.id).await.map_err(storage)?;
        let result = self.apply(&mut order, &notification, &event_type).await;
        if let Err(unlock_error) = self.lock.unlock(order.id).await {
            tracing::warn!(order_id = %order.id, error = %unlock_error, "could not release order lock");
        }
        let outcome = result?;

        // The instant-settle step talks to the processor, so it runs after
        // the lock is released.
        if outcome == ProcessWebhookOutcome::Applied(WebhookEventType::InvoiceAuthorized) {
            self.instant_settle
                .handle(InstantSettleCommand { order_id: order.id })
                .await
                .map_err(|e| WebhookError::Processor(e.to_string()))?;
        }

        if matches!(outcome, ProcessWebhookOutcome::Applied(_)) {
            self.hooks.webhook_applied(order.id, &event_type).await;
        }

        tracing::info!(
            event_id = %notification.id,
            event_type = event_type.as_str(),
            order_id = %order.id,
            outcome = ?outcome,
            "webhook processed"
        );
        Ok(outcome)
    }

    async fn apply(
        &self,
        order: &mut OrderRecord,
        notification: &WebhookNotification,
        event_type: &WebhookEventType,
    ) -> Result<ProcessWebhookOutcome, WebhookError> {
        match event_type {
            WebhookEventType::InvoiceCreated => {
                self.note(order, "Invoice created at processor").await?;
                Ok(ProcessWebhookOutcome::Acknowledged(event_type.clone()))
            }

            WebhookEventType::InvoiceAuthorized => {
                self.apply_status(
                    order,
                    OrderPaymentStatus::Authorized,
                    notification.transaction.as_deref(),
                    event_type,
                )
                .await
            }

            WebhookEventType::InvoiceSettled => {
                if order.payment.status == OrderPaymentStatus::Settled
                    && order.payment.capture_transaction_id == notification.transaction
                {
                    return Ok(ProcessWebhookOutcome::AlreadyApplied(event_type.clone()));
                }

                let invoice = self
                    .client
                    .get_invoice(&order.invoice_handle().cloned().ok_or_else(|| {
                        WebhookError::UnknownHandle(notification.id.clone())
                    })?)
                    .await
                    .map_err(|e| WebhookError::Processor(e.to_string()))?;

                self.mirror_surcharge_lines(order, &invoice).await?;
                self.apply_status(
                    order,
                    OrderPaymentStatus::Settled,
                    notification.transaction.as_deref(),
                    event_type,
                )
                .await
            }

            WebhookEventType::InvoiceCancelled => {
                self.apply_status(
                    order,
                    OrderPaymentStatus::Cancelled,
                    notification.transaction.as_deref(),
                    event_type,
                )
                .await
            }

            WebhookEventType::InvoiceFailed => {
                self.apply_status(order, OrderPaymentStatus::Failed, None, event_type)
                    .await
            }

            WebhookEventType::InvoiceRefund => self.apply_refund(order, event_type).await,

            WebhookEventType::Unhandled(name) => {
                // Filtered out before the lock is taken.
                Ok(ProcessWebhookOutcome::Unhandled(name.clone()))
            }
        }
    }

    async fn apply_status(
        &self,
        order: &mut OrderRecord,
        status: OrderPaymentStatus,
        transaction: Option<&str>,
        event_type: &WebhookEventType,
    ) -> Result<ProcessWebhookOutcome, WebhookError> {
        match apply_invoice_state(order, status, transaction) {
            ApplyOutcome::Applied => {
                self.store.save_order(order).await.map_err(storage)?;
                self.note(
                    order,
                    &format!("Payment {} via webhook", status.as_str()),
                )
                .await?;
                Ok(ProcessWebhookOutcome::Applied(event_type.clone()))
            }
            ApplyOutcome::AlreadyApplied => {
                Ok(ProcessWebhookOutcome::AlreadyApplied(event_type.clone()))
            }
            ApplyOutcome::Rejected => {
                // Monotonicity wins over event ordering: a late event for an
                // earlier state is acknowledged, not applied.
                tracing::warn!(
                    order_id = %order.id,
                    current = order.payment.status.as_str(),
                    incoming = status.as_str(),
                    "ignoring out-of-order webhook state"
                );
                Ok(ProcessWebhookOutcome::AlreadyApplied(event_type.clone()))
            }
        }
    }

    /// Per-credit-note refund application; ids already recorded are skipped.
    async fn apply_refund(
        &self,
        order: &mut OrderRecord,
        event_type: &WebhookEventType,
    ) -> Result<ProcessWebhookOutcome, WebhookError> {
        let handle = order
            .invoice_handle()
            .cloned()
            .ok_or_else(|| WebhookError::MissingField("invoice"))?;
        let invoice = self
            .client
            .get_invoice(&handle)
            .await
            .map_err(|e| WebhookError::Processor(e.to_string()))?;

        let mut new_notes = Vec::new();
        for credit_note in &invoice.credit_notes {
            if order.record_credit_note(&credit_note.id) {
                new_notes.push(credit_note.clone());
            }
        }

        if new_notes.is_empty() {
            return Ok(ProcessWebhookOutcome::AlreadyApplied(event_type.clone()));
        }

        self.store.save_order(order).await.map_err(storage)?;
        for credit_note in &new_notes {
            self.note(
                order,
                &format!(
                    "Refund of {} {} applied (credit note {})",
                    credit_note.amount, order.currency, credit_note.id
                ),
            )
            .await?;
        }
        Ok(ProcessWebhookOutcome::Applied(event_type.clone()))
    }

    /// Copies processor-added surcharge fee lines onto the local order so
    /// its total matches what was actually settled.
    async fn mirror_surcharge_lines(
        &self,
        order: &mut OrderRecord,
        invoice: &crate::domain::invoice::Invoice,
    ) -> Result<(), WebhookError> {
        for line in invoice.order_lines.iter().filter(|l| l.is_surcharge_fee()) {
            if order.lines.iter().any(|local| local.id == line.id) {
                continue;
            }
            order.lines.push(OrderLine {
                id: line.id.clone(),
                description: line.ordertext.clone(),
                quantity: line.quantity,
                unit_amount: line.amount,
                vat_rate: Decimal::ZERO,
                amount_includes_vat: true,
                category: LineCategory::Fee,
            });
            order.total_amount += line.total();
            self.note(
                order,
                &format!(
                    "Surcharge fee of {} {} mirrored from invoice",
                    line.total(),
                    order.currency
                ),
            )
            .await?;
        }
        Ok(())
    }

    async fn note(&self, order: &OrderRecord, text: &str) -> Result<(), WebhookError> {
        self.store.add_note(order.id, text).await.map_err(storage)
    }
}

fn storage(error: DomainError) -> WebhookError {
    WebhookError::Storage(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOrderLock, InMemoryOrderStore, MockProcessorClient, RecordingHooks,
    };
    use crate::domain::foundation::{CustomerHandle, OrderId};
    use crate::domain::invoice::InvoiceHandle;
    use crate::domain::settlement::SettlePolicy;
    use crate::ports::{ChargeRequest, ProcessorClient, RefundRequest};

    const SECRET: &str = "whsec_test";

    struct Fixture {
        store: Arc<InMemoryOrderStore>,
        mock: Arc<MockProcessorClient>,
        lock: Arc<InMemoryOrderLock>,
        hooks: Arc<RecordingHooks>,
        handler: ProcessWebhookHandler,
    }

    fn fixture(policy: SettlePolicy) -> Fixture {
        let store = Arc::new(InMemoryOrderStore::new());
        let mock = Arc::new(MockProcessorClient::new());
        let lock = Arc::new(InMemoryOrderLock::new());
        let hooks = Arc::new(RecordingHooks::new());
        let instant_settle = Arc::new(InstantSettleHandler::new(
            store.clone(),
            mock.clone(),
            policy,
            false,
        ));
        let handler = ProcessWebhookHandler::new(
            store.clone(),
            mock.clone(),
            lock.clone(),
            hooks.clone(),
            WebhookVerifier::new(SECRET),
            instant_settle,
        );
        Fixture {
            store,
            mock,
            lock,
            hooks,
            handler,
        }
    }

    fn signed_payload(event_type: &str, invoice: &str, transaction: Option<&str>) -> Vec<u8> {
        let verifier = WebhookVerifier::new(SECRET);
        let id = format!("evt-{}-{}", event_type, transaction.unwrap_or("none"));
        let timestamp = "2024-06-01T12:00:00.000+00:00";
        let signature = verifier.sign(timestamp, &id);
        let notification = WebhookNotification {
            id,
            event_type: event_type.to_string(),
            invoice: Some(invoice.to_string()),
            transaction: transaction.map(str::to_string),
            credit_note: None,
            customer: None,
            timestamp: timestamp.to_string(),
            signature,
        };
        serde_json::to_vec(&notification).unwrap()
    }

    async fn seed_order(fixture: &Fixture, settle: bool) -> OrderRecord {
        let mut order = OrderRecord::new(
            OrderId::new(11),
            CustomerHandle::new("cust-11").unwrap(),
            "EUR",
            7000,
            vec![],
        );
        let handle = InvoiceHandle::base(order.id);
        fixture
            .mock
            .charge(ChargeRequest {
                handle: handle.clone(),
                customer: order.customer.clone(),
                currency: order.currency.clone(),
                amount: Some(7000),
                order_lines: vec![],
                source: "tok".to_string(),
                settle,
            })
            .await
            .unwrap();
        order.payment.invoice_handle = Some(handle);
        fixture.store.insert_order(order.clone());
        order
    }

    #[tokio::test]
    async fn authorized_event_applies_and_fires_hook() {
        let f = fixture(SettlePolicy::none());
        let order = seed_order(&f, false).await;

        let outcome = f
            .handler
            .handle(ProcessWebhookCommand {
                payload: signed_payload("invoice_authorized", "order-11", Some("txn-1")),
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessWebhookOutcome::Applied(WebhookEventType::InvoiceAuthorized)
        );
        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Authorized);
        assert_eq!(saved.payment.transaction_id.as_deref(), Some("txn-1"));
        assert_eq!(f.hooks.applied_events().len(), 1);
        assert!(!f.lock.is_locked(order.id));
    }

    #[tokio::test]
    async fn redelivered_event_is_idempotent() {
        let f = fixture(SettlePolicy::none());
        let order = seed_order(&f, false).await;
        let payload = signed_payload("invoice_authorized", "order-11", Some("txn-1"));

        f.handler
            .handle(ProcessWebhookCommand {
                payload: payload.clone(),
            })
            .await
            .unwrap();
        let outcome = f
            .handler
            .handle(ProcessWebhookCommand { payload })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessWebhookOutcome::AlreadyApplied(WebhookEventType::InvoiceAuthorized)
        );
        assert_eq!(f.hooks.applied_events().len(), 1);
        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Authorized);
    }

    #[tokio::test]
    async fn invalid_signature_is_rejected_without_mutation() {
        let f = fixture(SettlePolicy::none());
        let order = seed_order(&f, false).await;

        let mut payload = signed_payload("invoice_authorized", "order-11", Some("txn-1"));
        // Corrupt the signature hex.
        let len = payload.len();
        payload[len - 10] = b'0';

        let error = f
            .handler
            .handle(ProcessWebhookCommand { payload })
            .await
            .unwrap_err();
        assert!(matches!(error, WebhookError::InvalidSignature));

        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_handle_is_acknowledged_as_error() {
        let f = fixture(SettlePolicy::none());

        let error = f
            .handler
            .handle(ProcessWebhookCommand {
                payload: signed_payload("invoice_authorized", "order-404", Some("txn-1")),
            })
            .await
            .unwrap_err();

        assert!(matches!(error, WebhookError::UnknownHandle(_)));
        assert_eq!(error.status_code(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn unhandled_event_goes_to_the_extension_hook() {
        let f = fixture(SettlePolicy::none());
        seed_order(&f, false).await;

        let outcome = f
            .handler
            .handle(ProcessWebhookCommand {
                payload: signed_payload("customer_payment_method_added", "order-11", None),
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessWebhookOutcome::Unhandled("customer_payment_method_added".to_string())
        );
        assert_eq!(f.hooks.unhandled_events().len(), 1);
        assert!(f.hooks.applied_events().is_empty());
    }

    #[tokio::test]
    async fn authorized_event_triggers_instant_settle() {
        use rust_decimal_macros::dec;

        let f = fixture(SettlePolicy::new([LineCategory::Virtual]));
        let mut order = OrderRecord::new(
            OrderId::new(11),
            CustomerHandle::new("cust-11").unwrap(),
            "EUR",
            7000,
            vec![OrderLine {
                id: "a".to_string(),
                description: "Download".to_string(),
                quantity: 1,
                unit_amount: 7000,
                vat_rate: dec!(0.25),
                amount_includes_vat: true,
                category: LineCategory::Virtual,
            }],
        );
        let handle = InvoiceHandle::base(order.id);
        f.mock
            .charge(ChargeRequest {
                handle: handle.clone(),
                customer: order.customer.clone(),
                currency: order.currency.clone(),
                amount: Some(7000),
                order_lines: vec![],
                source: "tok".to_string(),
                settle: false,
            })
            .await
            .unwrap();
        order.payment.invoice_handle = Some(handle);
        f.store.insert_order(order.clone());

        f.handler
            .handle(ProcessWebhookCommand {
                payload: signed_payload("invoice_authorized", "order-11", Some("txn-1")),
            })
            .await
            .unwrap();

        assert_eq!(f.mock.invoice("order-11").unwrap().settled_amount, 7000);
        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Settled);
    }

    #[tokio::test]
    async fn settled_event_mirrors_surcharge_lines() {
        use crate::domain::invoice::InvoiceLine;

        let f = fixture(SettlePolicy::none());
        let mut order = seed_order(&f, false).await;
        order.payment.status = OrderPaymentStatus::Authorized;
        f.store.insert_order(order.clone());

        // Processor settled and added a card surcharge line.
        let mut invoice = f.mock.invoice("order-11").unwrap();
        invoice.state = crate::domain::invoice::InvoiceState::Settled;
        invoice.settled_amount = 7150;
        invoice.order_lines.push(InvoiceLine {
            id: "sf-1".to_string(),
            ordertext: "Card surcharge".to_string(),
            quantity: 1,
            amount: 150,
            origin: Some("surcharge_fee".to_string()),
        });
        f.mock.add_invoice(invoice);

        let outcome = f
            .handler
            .handle(ProcessWebhookCommand {
                payload: signed_payload("invoice_settled", "order-11", Some("txn-2")),
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessWebhookOutcome::Applied(WebhookEventType::InvoiceSettled)
        );
        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Settled);
        assert_eq!(saved.total_amount, 7150);
        assert!(saved.lines.iter().any(|l| l.id == "sf-1"));
    }

    #[tokio::test]
    async fn refund_event_applies_each_credit_note_once() {
        let f = fixture(SettlePolicy::none());
        let mut order = seed_order(&f, true).await;
        order.payment.status = OrderPaymentStatus::Settled;
        f.store.insert_order(order.clone());

        f.mock
            .refund(RefundRequest {
                invoice: "order-11".to_string(),
                amount: 1500,
                text: None,
                key: None,
            })
            .await
            .unwrap();

        let payload = signed_payload("invoice_refund", "order-11", None);
        let outcome = f
            .handler
            .handle(ProcessWebhookCommand {
                payload: payload.clone(),
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ProcessWebhookOutcome::Applied(WebhookEventType::InvoiceRefund)
        );

        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.credit_note_ids.len(), 1);

        // Redelivery applies nothing new.
        let outcome = f
            .handler
            .handle(ProcessWebhookCommand { payload })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ProcessWebhookOutcome::AlreadyApplied(WebhookEventType::InvoiceRefund)
        );
    }

    #[tokio::test]
    async fn late_cancel_after_settle_is_ignored() {
        let f = fixture(SettlePolicy::none());
        let mut order = seed_order(&f, true).await;
        order.payment.status = OrderPaymentStatus::Settled;
        f.store.insert_order(order.clone());

        let outcome = f
            .handler
            .handle(ProcessWebhookCommand {
                payload: signed_payload("invoice_cancelled", "order-11", Some("txn-9")),
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessWebhookOutcome::AlreadyApplied(WebhookEventType::InvoiceCancelled)
        );
        let saved = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment.status, OrderPaymentStatus::Settled);
    }
}
