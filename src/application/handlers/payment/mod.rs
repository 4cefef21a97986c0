//! Payment command handlers.
//!
//! # Module Structure
//!
//! - `apply_invoice_state` - idempotent state application shared by all paths
//! - `charge_order` - charge with handle failover
//! - `instant_settle` - policy-driven capture after authorization
//! - `capture_payment` - manual full/partial capture
//! - `cancel_payment` - void an authorization
//! - `refund_payment` - credit-note refunds

mod apply_invoice_state;
mod cancel_payment;
mod capture_payment;
mod charge_order;
mod instant_settle;
mod refund_payment;

pub use apply_invoice_state::{apply_invoice_state, ApplyOutcome};
pub use cancel_payment::{CancelOutcome, CancelPaymentCommand, CancelPaymentHandler};
pub use capture_payment::{CaptureOutcome, CapturePaymentCommand, CapturePaymentHandler};
pub use charge_order::{ChargeOrderCommand, ChargeOrderHandler, ChargeOrderOutcome};
pub use instant_settle::{InstantSettleCommand, InstantSettleHandler, InstantSettleOutcome};
pub use refund_payment::{RefundOutcome, RefundPaymentCommand, RefundPaymentHandler};
