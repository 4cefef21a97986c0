//! Webhook signature verification.
//!
//! The processor signs each notification with
//! `hex(HMAC-SHA256(timestamp + id, webhook_secret))`. Verification uses a
//! constant-time comparison and happens before any order lookup.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{WebhookError, WebhookNotification};

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex encoding.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Verifies webhook notification signatures.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Checks the notification's signature against its timestamp and id.
    pub fn verify(&self, notification: &WebhookNotification) -> Result<(), WebhookError> {
        let provided = hex_decode(&notification.signature).ok_or_else(|| {
            tracing::warn!(event_id = %notification.id, "Webhook signature is not valid hex");
            WebhookError::InvalidSignature
        })?;

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(notification.timestamp.as_bytes());
        mac.update(notification.id.as_bytes());
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(&provided).unwrap_u8() != 1 {
            tracing::warn!(event_id = %notification.id, "Invalid webhook signature");
            return Err(WebhookError::InvalidSignature);
        }

        Ok(())
    }

    /// Computes a valid signature for a timestamp/id pair.
    ///
    /// Used by tests and by the mock processor.
    pub fn sign(&self, timestamp: &str, id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(timestamp.as_bytes());
        mac.update(id.as_bytes());
        hex_encode(&mac.finalize().into_bytes())
    }
}
