//! In-memory implementations of the `EngineHooks` port.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::OrderId;
use crate::domain::webhook::{WebhookEventType, WebhookNotification};
use crate::ports::EngineHooks;

/// Hooks implementation that does nothing. Default for deployments with
/// no host platform extensions.
#[derive(Default, Clone)]
pub struct NoopHooks;

#[async_trait]
impl EngineHooks for NoopHooks {
    async fn webhook_applied(&self, _order_id: OrderId, _event_type: &WebhookEventType) {}

    async fn unhandled_event(&self, notification: &WebhookNotification) {
        tracing::debug!(
            event_id = %notification.id,
            event_type = %notification.event_type,
            "ignoring unhandled webhook event"
        );
    }
}

/// Hooks implementation that records every signal, for assertions.
#[derive(Default, Clone)]
pub struct RecordingHooks {
    inner: Arc<Mutex<RecordedSignals>>,
}

#[derive(Default)]
struct RecordedSignals {
    applied: Vec<(OrderId, WebhookEventType)>,
    unhandled: Vec<WebhookNotification>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_events(&self) -> Vec<(OrderId, WebhookEventType)> {
        self.inner.lock().unwrap().applied.clone()
    }

    pub fn unhandled_events(&self) -> Vec<WebhookNotification> {
        self.inner.lock().unwrap().unhandled.clone()
    }
}

#[async_trait]
impl EngineHooks for RecordingHooks {
    async fn webhook_applied(&self, order_id: OrderId, event_type: &WebhookEventType) {
        self.inner
            .lock()
            .unwrap()
            .applied
            .push((order_id, event_type.clone()));
    }

    async fn unhandled_event(&self, notification: &WebhookNotification) {
        self.inner
            .lock()
            .unwrap()
            .unhandled
            .push(notification.clone());
    }
}
