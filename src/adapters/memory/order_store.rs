//! In-memory implementation of the `OrderStore` port.
//!
//! Backs unit and integration tests, and doubles as the storage adapter
//! for single-process deployments without a host platform attached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::{CustomerHandle, DomainError, OrderId};
use crate::domain::order::OrderRecord;
use crate::ports::OrderStore;

/// Thread-safe in-memory order store.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    inner: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    orders: HashMap<u64, OrderRecord>,
    notes: HashMap<u64, Vec<String>>,
    last_action_errors: HashMap<u64, String>,
    customer_tokens: HashMap<String, String>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order.
    pub fn insert_order(&self, order: OrderRecord) {
        self.inner
            .lock()
            .unwrap()
            .orders
            .insert(order.id.value(), order);
    }

    /// Seed a customer-level stored payment token.
    pub fn set_customer_token(&self, customer: &str, token: &str) {
        self.inner
            .lock()
            .unwrap()
            .customer_tokens
            .insert(customer.to_string(), token.to_string());
    }

    /// Notes recorded against an order, for assertions.
    pub fn notes(&self, id: OrderId) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .notes
            .get(&id.value())
            .cloned()
            .unwrap_or_default()
    }

    /// Last recorded action error, for assertions.
    pub fn last_action_error(&self, id: OrderId) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .last_action_errors
            .get(&id.value())
            .cloned()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>, DomainError> {
        Ok(self.inner.lock().unwrap().orders.get(&id.value()).cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<OrderRecord>, DomainError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .orders
            .values()
            .find(|order| {
                order
                    .payment
                    .invoice_handle
                    .as_ref()
                    .is_some_and(|h| h.as_str() == handle)
            })
            .cloned())
    }

    async fn save_order(&self, order: &OrderRecord) -> Result<(), DomainError> {
        self.inner
            .lock()
            .unwrap()
            .orders
            .insert(order.id.value(), order.clone());
        Ok(())
    }

    async fn add_note(&self, id: OrderId, note: &str) -> Result<(), DomainError> {
        self.inner
            .lock()
            .unwrap()
            .notes
            .entry(id.value())
            .or_default()
            .push(note.to_string());
        Ok(())
    }

    async fn set_last_action_error(&self, id: OrderId, message: &str) -> Result<(), DomainError> {
        self.inner
            .lock()
            .unwrap()
            .last_action_errors
            .insert(id.value(), message.to_string());
        Ok(())
    }

    async fn find_customer_token(
        &self,
        customer: &CustomerHandle,
    ) -> Result<Option<String>, DomainError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .customer_tokens
            .get(customer.as_str())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderRecord;

    fn order(id: u64) -> OrderRecord {
        OrderRecord::new(
            OrderId::new(id),
            CustomerHandle::new("cust-1").unwrap(),
            "EUR",
            1000,
            vec![],
        )
    }

    #[tokio::test]
    async fn save_and_get_round_trip() {
        let store = InMemoryOrderStore::new();
        let record = order(7);
        store.save_order(&record).await.unwrap();

        let loaded = store.get_order(OrderId::new(7)).await.unwrap().unwrap();
        assert_eq!(loaded.id.value(), 7);
        assert!(store.get_order(OrderId::new(8)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_handle_matches_current_handle_only() {
        let store = InMemoryOrderStore::new();
        let mut record = order(7);
        record.payment.invoice_handle =
            Some(crate::domain::invoice::InvoiceHandle::from_stored("order-7"));
        store.save_order(&record).await.unwrap();

        assert!(store.find_by_handle("order-7").await.unwrap().is_some());
        assert!(store.find_by_handle("order-8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn notes_accumulate() {
        let store = InMemoryOrderStore::new();
        store.add_note(OrderId::new(1), "first").await.unwrap();
        store.add_note(OrderId::new(1), "second").await.unwrap();
        assert_eq!(store.notes(OrderId::new(1)), vec!["first", "second"]);
    }
}
