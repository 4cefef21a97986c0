//! In-memory adapters.
//!
//! # Module Structure
//!
//! - `order_store` - in-memory `OrderStore`
//! - `order_lock` - in-memory `OrderLock`
//! - `hooks` - no-op and recording `EngineHooks`
//! - `mock_processor` - scriptable `ProcessorClient` for tests

mod hooks;
mod mock_processor;
mod order_lock;
mod order_store;

pub use hooks::{NoopHooks, RecordingHooks};
pub use mock_processor::MockProcessorClient;
pub use order_lock::InMemoryOrderLock;
pub use order_store::InMemoryOrderStore;
