//! Command handlers.
//!
//! # Module Structure
//!
//! - `payment` - charge, capture, cancel, refund, instant settle
//! - `webhook` - webhook reconciliation
//! - `subscription` - renewal charges

pub mod payment;
pub mod subscription;
pub mod webhook;
