//! OrderLock port - advisory per-order reconciliation lock.
//!
//! Serializes the synchronous charge-result path against a concurrently
//! delivered webhook for the same order. The lock is advisory with a
//! bounded wait, not a hard guarantee; every state transition must be
//! idempotent as the second line of defense.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::{DomainError, OrderId};

/// Number of poll attempts while waiting for another holder.
pub const LOCK_WAIT_ATTEMPTS: u32 = 6;

/// Sleep between poll attempts. With 6 attempts this gives a ~300ms
/// total wait budget, sized for a realistic webhook race window.
pub const LOCK_WAIT_INTERVAL: Duration = Duration::from_millis(50);

/// Port for the per-order lock flag.
#[async_trait]
pub trait OrderLock: Send + Sync {
    /// Set the lock flag for the order.
    async fn lock(&self, id: OrderId) -> Result<(), DomainError>;

    /// Clear the lock flag for the order.
    async fn unlock(&self, id: OrderId) -> Result<(), DomainError>;

    /// Poll until the order is unlocked or the wait budget is spent.
    ///
    /// Returns `true` if the lock was observed held at any point, meaning
    /// another process may have mutated the order and the caller must
    /// re-read it before acting.
    async fn wait_for_unlock(&self, id: OrderId) -> Result<bool, DomainError>;
}
