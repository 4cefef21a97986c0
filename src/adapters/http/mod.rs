//! Inbound HTTP adapters.
//!
//! # Module Structure
//!
//! - `payment` - webhook endpoint and payment action routes

pub mod payment;
