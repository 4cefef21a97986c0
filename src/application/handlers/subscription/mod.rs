//! Subscription renewal handlers.

mod charge_renewal;

pub use charge_renewal::{ChargeRenewalCommand, ChargeRenewalHandler};
