//! HTTP implementation of the [`ProcessorClient`] port.

use async_trait::async_trait;

use crate::config::ProcessorConfig;
use crate::domain::foundation::CustomerHandle;
use crate::domain::invoice::{Invoice, InvoiceHandle};
use crate::ports::{
    CancelResult, ChargeRequest, ChargeResult, ChargeSessionRequest, PaymentMethod,
    ProcessorClient, ProcessorError, RefundRequest, RefundResult, SessionResult, SettleRequest,
    SettleResult, WebhookSettings,
};

use super::transport::ApiTransport;
use super::types::{
    ApiCancelResponse, ApiChargeRequest, ApiChargeResponse, ApiOrderLine, ApiPaymentMethodList,
    ApiRefundRequest, ApiRefundResponse, ApiSessionOrder, ApiSessionRequest, ApiSessionResponse,
    ApiSettleRequest, ApiSettleResponse, ApiWebhookSettings,
};

/// Processor REST API client.
pub struct HttpProcessorClient {
    transport: ApiTransport,
}

impl HttpProcessorClient {
    /// Build a client from processor configuration.
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        Ok(Self {
            transport: ApiTransport::new(config)?,
        })
    }
}

#[async_trait]
impl ProcessorClient for HttpProcessorClient {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeResult, ProcessorError> {
        let body = ApiChargeRequest {
            handle: request.handle.as_str().to_string(),
            customer: request.customer.as_str().to_string(),
            currency: request.currency,
            source: request.source,
            settle: request.settle,
            amount: request.amount,
            order_lines: request.order_lines.iter().map(ApiOrderLine::from).collect(),
        };

        let response: ApiChargeResponse = self.transport.post("/v1/charge", &body).await?;
        Ok(ChargeResult {
            handle: response.handle,
            state: response.state,
            transaction: response.transaction,
            amount: response.amount,
        })
    }

    async fn settle(
        &self,
        handle: &InvoiceHandle,
        request: SettleRequest,
    ) -> Result<SettleResult, ProcessorError> {
        let body = ApiSettleRequest {
            amount: request.amount,
            order_lines: request.order_lines.iter().map(ApiOrderLine::from).collect(),
            key: request.key,
        };

        let path = format!("/v1/charge/{}/settle", handle.as_str());
        let response: ApiSettleResponse = self.transport.post(&path, &body).await?;
        Ok(SettleResult {
            state: response.state,
            transaction: response.transaction,
            settled_amount: response.settled_amount,
        })
    }

    async fn cancel(&self, handle: &InvoiceHandle) -> Result<CancelResult, ProcessorError> {
        let path = format!("/v1/charge/{}/cancel", handle.as_str());
        let response: ApiCancelResponse = self.transport.post_empty(&path).await?;
        Ok(CancelResult {
            state: response.state,
            transaction: response.transaction,
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundResult, ProcessorError> {
        let body = ApiRefundRequest {
            invoice: request.invoice,
            amount: request.amount,
            text: request.text,
            key: request.key,
        };

        let response: ApiRefundResponse = self.transport.post("/v1/refund", &body).await?;
        Ok(RefundResult {
            credit_note_id: response.credit_note_id,
            state: response.state,
            amount: response.amount,
        })
    }

    async fn get_invoice(&self, handle: &InvoiceHandle) -> Result<Invoice, ProcessorError> {
        let path = format!("/v1/invoice/{}", handle.as_str());
        self.transport.get(&path).await
    }

    async fn configure_webhooks(&self, settings: WebhookSettings) -> Result<(), ProcessorError> {
        let body = ApiWebhookSettings {
            urls: settings.urls,
            disabled: settings.disabled,
        };

        let _echoed: ApiWebhookSettings = self
            .transport
            .put("/v1/account/webhook_settings", &body)
            .await?;
        Ok(())
    }

    async fn create_recurring_session(
        &self,
        customer: &CustomerHandle,
    ) -> Result<SessionResult, ProcessorError> {
        let body = ApiSessionRequest {
            customer: Some(customer.as_str().to_string()),
            order: None,
            accept_url: None,
            cancel_url: None,
        };

        let response: ApiSessionResponse =
            self.transport.post("/v1/session/recurring", &body).await?;
        Ok(SessionResult {
            session_id: response.id,
            url: response.url,
        })
    }

    async fn create_charge_session(
        &self,
        request: ChargeSessionRequest,
    ) -> Result<SessionResult, ProcessorError> {
        let body = ApiSessionRequest {
            customer: None,
            order: Some(ApiSessionOrder {
                handle: request.handle.as_str().to_string(),
                customer: request.customer.as_str().to_string(),
                currency: request.currency,
                amount: request.amount,
            }),
            accept_url: Some(request.accept_url),
            cancel_url: Some(request.cancel_url),
        };

        let response: ApiSessionResponse =
            self.transport.post("/v1/session/charge", &body).await?;
        Ok(SessionResult {
            session_id: response.id,
            url: response.url,
        })
    }

    async fn get_payment_methods(
        &self,
        customer: &CustomerHandle,
    ) -> Result<Vec<PaymentMethod>, ProcessorError> {
        let path = format!("/v1/customer/{}/payment_method", customer.as_str());
        let response: ApiPaymentMethodList = self.transport.get(&path).await?;

        Ok(response
            .cards
            .into_iter()
            .map(|method| PaymentMethod {
                id: method.id,
                state: method.state,
                card_type: method.card.as_ref().and_then(|c| c.card_type.clone()),
                masked_card: method.card.as_ref().and_then(|c| c.masked_card.clone()),
            })
            .collect())
    }
}
