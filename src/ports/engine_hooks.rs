//! EngineHooks port - signals the host platform can subscribe to.
//!
//! The reconciler fires `webhook_applied` after every applied event, and
//! routes unknown event types to `unhandled_event` instead of dropping
//! them, so the host can extend behavior without engine changes.

use async_trait::async_trait;

use crate::domain::foundation::OrderId;
use crate::domain::webhook::{WebhookEventType, WebhookNotification};

/// Port for host-platform extension points.
#[async_trait]
pub trait EngineHooks: Send + Sync {
    /// Fired after a webhook event has been applied to an order.
    async fn webhook_applied(&self, order_id: OrderId, event_type: &WebhookEventType);

    /// Fired for event types the engine does not handle itself.
    async fn unhandled_event(&self, notification: &WebhookNotification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_hooks_is_object_safe() {
        fn _accepts_dyn(_hooks: &dyn EngineHooks) {}
    }
}
