//! Settlement domain module.
//!
//! # Module Structure
//!
//! - `policy` - SettlePolicy category gating
//! - `calculator` - instant-settle calculation
//! - `amount` - minor-unit conversion with zero-decimal currency table

pub mod amount;
mod calculator;
mod policy;

pub use calculator::{calculate_instant_settle, InstantSettle, SettleLine};
pub use policy::SettlePolicy;
