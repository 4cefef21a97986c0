//! In-memory implementation of the `OrderLock` port.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::ports::{OrderLock, LOCK_WAIT_ATTEMPTS, LOCK_WAIT_INTERVAL};

/// Thread-safe in-memory advisory lock.
#[derive(Default, Clone)]
pub struct InMemoryOrderLock {
    held: Arc<Mutex<HashSet<u64>>>,
}

impl InMemoryOrderLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the lock is currently held, for assertions.
    pub fn is_locked(&self, id: OrderId) -> bool {
        self.held.lock().unwrap().contains(&id.value())
    }
}

#[async_trait]
impl OrderLock for InMemoryOrderLock {
    async fn lock(&self, id: OrderId) -> Result<(), DomainError> {
        self.held.lock().unwrap().insert(id.value());
        Ok(())
    }

    async fn unlock(&self, id: OrderId) -> Result<(), DomainError> {
        self.held.lock().unwrap().remove(&id.value());
        Ok(())
    }

    async fn wait_for_unlock(&self, id: OrderId) -> Result<bool, DomainError> {
        let mut observed_held = false;
        for _ in 0..LOCK_WAIT_ATTEMPTS {
            if !self.held.lock().unwrap().contains(&id.value()) {
                return Ok(observed_held);
            }
            observed_held = true;
            tokio::time::sleep(LOCK_WAIT_INTERVAL).await;
        }
        Ok(observed_held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unheld_lock_returns_immediately() {
        let lock = InMemoryOrderLock::new();
        let observed = lock.wait_for_unlock(OrderId::new(1)).await.unwrap();
        assert!(!observed);
    }

    #[tokio::test]
    async fn lock_and_unlock_toggle_state() {
        let lock = InMemoryOrderLock::new();
        lock.lock(OrderId::new(1)).await.unwrap();
        assert!(lock.is_locked(OrderId::new(1)));

        lock.unlock(OrderId::new(1)).await.unwrap();
        assert!(!lock.is_locked(OrderId::new(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_reports_contention_after_release() {
        let lock = InMemoryOrderLock::new();
        lock.lock(OrderId::new(1)).await.unwrap();

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move { lock.wait_for_unlock(OrderId::new(1)).await })
        };

        tokio::time::sleep(LOCK_WAIT_INTERVAL).await;
        lock.unlock(OrderId::new(1)).await.unwrap();

        let observed = waiter.await.unwrap().unwrap();
        assert!(observed);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_gives_up_after_budget() {
        let lock = InMemoryOrderLock::new();
        lock.lock(OrderId::new(1)).await.unwrap();

        let observed = lock.wait_for_unlock(OrderId::new(1)).await.unwrap();
        assert!(observed);
        assert!(lock.is_locked(OrderId::new(1)));
    }
}
