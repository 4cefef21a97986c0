//! Order domain module.
//!
//! # Module Structure
//!
//! - `order` - OrderRecord and the payment metadata block
//! - `line` - OrderLine and LineCategory
//! - `payment_status` - OrderPaymentStatus state machine

mod line;
mod order;
mod payment_status;

pub use line::{LineCategory, OrderLine};
pub use order::{OrderRecord, PaymentMeta};
pub use payment_status::OrderPaymentStatus;
