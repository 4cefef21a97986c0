//! Invoice handle generation.
//!
//! The handle is the idempotency key that maps a local order to exactly one
//! processor invoice. An order carries one current handle at a time; after a
//! collision a unique handle is generated once and the stale one is never
//! reused.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::OrderId;

/// Idempotency key for a processor invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceHandle(String);

impl InvoiceHandle {
    /// The base handle for an order: `order-<id>`.
    pub fn base(order_id: OrderId) -> Self {
        Self(format!("order-{}", order_id))
    }

    /// A unique handle after a collision: `order-<id>-<unixtime>`.
    pub fn unique(order_id: OrderId) -> Self {
        Self::unique_at(order_id, Utc::now().timestamp())
    }

    /// Unique handle with an explicit timestamp (deterministic for tests).
    pub fn unique_at(order_id: OrderId, unix_time: i64) -> Self {
        Self(format!("order-{}-{}", order_id, unix_time))
    }

    /// Wraps a handle previously stored on an order.
    pub fn from_stored(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
