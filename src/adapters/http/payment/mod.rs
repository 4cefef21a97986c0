//! HTTP adapter for the payment context.
//!
//! # Module Structure
//!
//! - `dto` - request/response types
//! - `handlers` - Axum handlers and application state
//! - `routes` - router configuration

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentAppState;
pub use routes::payment_router;
