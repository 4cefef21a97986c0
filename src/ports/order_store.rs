//! OrderStore port - the narrow collaborator interface to the host
//! platform's order storage.
//!
//! The engine never owns orders; it reads them and writes back the payment
//! metadata block. These five-and-a-bit operations are everything it needs
//! from the store, whatever shape the store takes in the host system.

use async_trait::async_trait;

use crate::domain::foundation::{CustomerHandle, DomainError, OrderId};
use crate::domain::order::OrderRecord;

/// Port for host-platform order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>, DomainError>;

    /// Resolve an order by its current processor invoice handle.
    ///
    /// Handles regenerated after a collision replace the stored handle, so
    /// at most one order matches.
    async fn find_by_handle(&self, handle: &str) -> Result<Option<OrderRecord>, DomainError>;

    /// Persist the order's payment metadata.
    async fn save_order(&self, order: &OrderRecord) -> Result<(), DomainError>;

    /// Append a human-readable note to the order's history.
    async fn add_note(&self, id: OrderId, note: &str) -> Result<(), DomainError>;

    /// Record a short-lived operator-visible message from a failed action.
    async fn set_last_action_error(&self, id: OrderId, message: &str) -> Result<(), DomainError>;

    /// Look up a customer-level stored payment token, if the host keeps
    /// one outside individual orders.
    async fn find_customer_token(
        &self,
        customer: &CustomerHandle,
    ) -> Result<Option<String>, DomainError>;
}
