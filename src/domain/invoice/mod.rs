//! Processor invoice domain module.
//!
//! # Module Structure
//!
//! - `state` - InvoiceState state machine
//! - `invoice` - Invoice snapshot and capture/cancel/refund eligibility
//! - `handle` - InvoiceHandle idempotency-key generation

mod handle;
mod invoice;
mod state;

pub use handle::InvoiceHandle;
pub use invoice::{CreditNote, Invoice, InvoiceLine};
pub use state::InvoiceState;
