//! Adapters implementing the ports.
//!
//! # Module Structure
//!
//! - `http` - inbound Axum routes (webhook endpoint, payment actions)
//! - `memory` - in-memory port implementations for tests and development
//! - `processor` - outbound HTTP client for the payment processor API

pub mod http;
pub mod memory;
pub mod processor;
