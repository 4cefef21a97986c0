//! Ports: async traits at the seams of the engine.

mod engine_hooks;
mod order_lock;
mod order_store;
mod processor_client;
mod processor_errors;

pub use engine_hooks::EngineHooks;
pub use order_lock::{OrderLock, LOCK_WAIT_ATTEMPTS, LOCK_WAIT_INTERVAL};
pub use order_store::OrderStore;
pub use processor_client::{
    CancelResult, ChargeRequest, ChargeResult, ChargeSessionRequest, PaymentMethod,
    ProcessorClient, RefundRequest, RefundResult, SessionResult, SettleRequest, SettleResult,
    WebhookSettings,
};
pub use processor_errors::{ApiErrorCode, ProcessorError};
