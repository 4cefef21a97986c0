//! Webhook domain module.
//!
//! # Module Structure
//!
//! - `event` - notification model and event-type tagged union
//! - `verifier` - HMAC-SHA256 signature verification
//! - `errors` - WebhookError with HTTP status mapping

mod errors;
mod event;
mod verifier;

pub use errors::WebhookError;
pub use event::{WebhookEventType, WebhookNotification};
pub use verifier::{hex_encode, WebhookVerifier};
