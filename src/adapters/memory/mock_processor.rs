//! Mock processor client for testing.
//!
//! Configurable mock implementation of `ProcessorClient` for unit and
//! integration tests. Supports:
//! - A scriptable invoice "database"
//! - Per-method error injection (one-shot queues)
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::CustomerHandle;
use crate::domain::invoice::{CreditNote, Invoice, InvoiceHandle, InvoiceState};
use crate::ports::{
    ApiErrorCode, CancelResult, ChargeRequest, ChargeResult, ChargeSessionRequest, PaymentMethod,
    ProcessorClient, ProcessorError, RefundRequest, RefundResult, SessionResult, SettleRequest,
    SettleResult, WebhookSettings,
};

/// Mock processor for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockProcessorClient::new();
/// mock.add_invoice(invoice);
/// mock.queue_error("settle", ProcessorError::Api { code: 85, message: "...".into() });
/// ```
#[derive(Default, Clone)]
pub struct MockProcessorClient {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Invoices by handle.
    invoices: HashMap<String, Invoice>,

    /// Stored payment methods by customer handle.
    payment_methods: HashMap<String, Vec<PaymentMethod>>,

    /// One-shot error queues by method name.
    error_queues: HashMap<String, Vec<ProcessorError>>,

    /// Track method calls for assertions.
    call_log: Vec<String>,

    /// Last webhook settings pushed.
    webhook_settings: Option<WebhookSettings>,

    /// Counter for generated ids.
    sequence: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}-{}", prefix, self.sequence)
    }

    fn take_error(&mut self, method: &str) -> Option<ProcessorError> {
        let queue = self.error_queues.get_mut(method)?;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

impl MockProcessorClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an invoice into the mock's database.
    pub fn add_invoice(&self, invoice: Invoice) {
        let handle = invoice.handle.clone();
        self.inner.lock().unwrap().invoices.insert(handle, invoice);
    }

    /// Queue an error returned on the next call to the named method.
    /// Repeated calls build a FIFO queue; later calls succeed normally.
    pub fn queue_error(&self, method: &str, error: ProcessorError) {
        self.inner
            .lock()
            .unwrap()
            .error_queues
            .entry(method.to_string())
            .or_default()
            .push(error);
    }

    /// Seed a stored payment method for a customer.
    pub fn add_payment_method(&self, customer: &str, method: PaymentMethod) {
        self.inner
            .lock()
            .unwrap()
            .payment_methods
            .entry(customer.to_string())
            .or_default()
            .push(method);
    }

    /// Methods invoked so far, for assertions.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Current invoice snapshot by handle, for assertions.
    pub fn invoice(&self, handle: &str) -> Option<Invoice> {
        self.inner.lock().unwrap().invoices.get(handle).cloned()
    }

    /// Webhook settings last pushed, for assertions.
    pub fn pushed_webhook_settings(&self) -> Option<WebhookSettings> {
        self.inner.lock().unwrap().webhook_settings.clone()
    }

    fn api_error(code: ApiErrorCode, message: &str) -> ProcessorError {
        ProcessorError::Api {
            code: code.code(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ProcessorClient for MockProcessorClient {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("charge".to_string());
        if let Some(error) = state.take_error("charge") {
            return Err(error);
        }

        let handle = request.handle.as_str().to_string();
        // Re-using a handle reports the state of the invoice occupying it,
        // same as the real API.
        if let Some(existing) = state.invoices.get(&handle) {
            let (code, message) = match existing.state {
                InvoiceState::Settled => {
                    (ApiErrorCode::InvoiceAlreadySettled, "Invoice already settled")
                }
                InvoiceState::Cancelled => (
                    ApiErrorCode::InvoiceAlreadyCancelled,
                    "Invoice already cancelled",
                ),
                _ => (
                    ApiErrorCode::InvoiceAlreadyAuthorized,
                    "Invoice already authorized",
                ),
            };
            return Err(Self::api_error(code, message));
        }

        let amount = request
            .amount
            .unwrap_or_else(|| request.order_lines.iter().map(|l| l.total()).sum());
        let transaction = state.next_id("txn");
        let invoice_state = if request.settle {
            InvoiceState::Settled
        } else {
            InvoiceState::Authorized
        };

        let invoice = Invoice {
            handle: handle.clone(),
            state: invoice_state,
            currency: request.currency,
            authorized_amount: amount,
            settled_amount: if request.settle { amount } else { 0 },
            refunded_amount: 0,
            transaction: Some(transaction.clone()),
            order_lines: vec![],
            credit_notes: vec![],
        };
        state.invoices.insert(handle.clone(), invoice);

        Ok(ChargeResult {
            handle,
            state: invoice_state,
            transaction: Some(transaction),
            amount,
        })
    }

    async fn settle(
        &self,
        handle: &InvoiceHandle,
        request: SettleRequest,
    ) -> Result<SettleResult, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("settle".to_string());
        if let Some(error) = state.take_error("settle") {
            return Err(error);
        }

        let transaction = state.next_id("txn");
        let invoice = state
            .invoices
            .get_mut(handle.as_str())
            .ok_or_else(|| Self::api_error(ApiErrorCode::InvoiceNotFound, "Invoice not found"))?;

        let requested = request.requested_amount();
        match invoice.state {
            InvoiceState::Settled if invoice.settled_amount >= invoice.authorized_amount => {
                return Err(Self::api_error(
                    ApiErrorCode::InvoiceAlreadySettled,
                    "Invoice already settled",
                ));
            }
            InvoiceState::Authorized | InvoiceState::Settled => {}
            _ => {
                return Err(Self::api_error(
                    ApiErrorCode::SettleNotAllowedInState,
                    "Settle not allowed in invoice state",
                ));
            }
        }

        if requested > invoice.authorized_amount - invoice.settled_amount {
            return Err(Self::api_error(
                ApiErrorCode::SettleAmountTooHigh,
                "Settle amount too high",
            ));
        }

        invoice.settled_amount += requested;
        invoice.state = InvoiceState::Settled;
        invoice.transaction = Some(transaction.clone());

        Ok(SettleResult {
            state: invoice.state,
            transaction: Some(transaction),
            settled_amount: invoice.settled_amount,
        })
    }

    async fn cancel(&self, handle: &InvoiceHandle) -> Result<CancelResult, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("cancel".to_string());
        if let Some(error) = state.take_error("cancel") {
            return Err(error);
        }

        let transaction = state.next_id("txn");
        let invoice = state
            .invoices
            .get_mut(handle.as_str())
            .ok_or_else(|| Self::api_error(ApiErrorCode::InvoiceNotFound, "Invoice not found"))?;

        match invoice.state {
            InvoiceState::Cancelled => Err(Self::api_error(
                ApiErrorCode::InvoiceAlreadyCancelled,
                "Invoice already cancelled",
            )),
            InvoiceState::Authorized | InvoiceState::Created | InvoiceState::Pending => {
                invoice.state = InvoiceState::Cancelled;
                invoice.transaction = Some(transaction.clone());
                Ok(CancelResult {
                    state: invoice.state,
                    transaction: Some(transaction),
                })
            }
            _ => Err(Self::api_error(
                ApiErrorCode::InvoiceWrongState,
                "Cancel not allowed in invoice state",
            )),
        }
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundResult, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("refund".to_string());
        if let Some(error) = state.take_error("refund") {
            return Err(error);
        }

        let credit_note_id = state.next_id("cn");
        let invoice = state
            .invoices
            .get_mut(&request.invoice)
            .ok_or_else(|| Self::api_error(ApiErrorCode::InvoiceNotFound, "Invoice not found"))?;

        if invoice.state != InvoiceState::Settled {
            return Err(Self::api_error(
                ApiErrorCode::RefundNotAllowedInState,
                "Refund not allowed in invoice state",
            ));
        }
        if request.amount > invoice.settled_amount - invoice.refunded_amount {
            return Err(Self::api_error(
                ApiErrorCode::RefundAmountTooHigh,
                "Refund amount too high",
            ));
        }

        invoice.refunded_amount += request.amount;
        invoice.credit_notes.push(CreditNote {
            id: credit_note_id.clone(),
            amount: request.amount,
        });

        Ok(RefundResult {
            credit_note_id,
            state: invoice.state,
            amount: request.amount,
        })
    }

    async fn get_invoice(&self, handle: &InvoiceHandle) -> Result<Invoice, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("get_invoice".to_string());
        if let Some(error) = state.take_error("get_invoice") {
            return Err(error);
        }

        state
            .invoices
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| Self::api_error(ApiErrorCode::InvoiceNotFound, "Invoice not found"))
    }

    async fn configure_webhooks(&self, settings: WebhookSettings) -> Result<(), ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("configure_webhooks".to_string());
        if let Some(error) = state.take_error("configure_webhooks") {
            return Err(error);
        }
        state.webhook_settings = Some(settings);
        Ok(())
    }

    async fn create_recurring_session(
        &self,
        _customer: &CustomerHandle,
    ) -> Result<SessionResult, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("create_recurring_session".to_string());
        if let Some(error) = state.take_error("create_recurring_session") {
            return Err(error);
        }
        let id = state.next_id("sess");
        Ok(SessionResult {
            url: Some(format!("https://checkout.test/{}", id)),
            session_id: id,
        })
    }

    async fn create_charge_session(
        &self,
        _request: ChargeSessionRequest,
    ) -> Result<SessionResult, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("create_charge_session".to_string());
        if let Some(error) = state.take_error("create_charge_session") {
            return Err(error);
        }
        let id = state.next_id("sess");
        Ok(SessionResult {
            url: Some(format!("https://checkout.test/{}", id)),
            session_id: id,
        })
    }

    async fn get_payment_methods(
        &self,
        customer: &CustomerHandle,
    ) -> Result<Vec<PaymentMethod>, ProcessorError> {
        let mut state = self.inner.lock().unwrap();
        state.call_log.push("get_payment_methods".to_string());
        if let Some(error) = state.take_error("get_payment_methods") {
            return Err(error);
        }
        Ok(state
            .payment_methods
            .get(customer.as_str())
            .cloned()
            .unwrap_or_default())
    }
}
