//! Domain layer: pure payment/settlement logic, no I/O.

pub mod foundation;
pub mod invoice;
pub mod order;
pub mod settlement;
pub mod webhook;
