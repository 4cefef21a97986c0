//! Processor REST API adapter.
//!
//! # Module Structure
//!
//! - `transport` - authenticated JSON transport with rate-limit handling
//! - `client` - [`HttpProcessorClient`] implementing the `ProcessorClient` port
//! - `types` - wire-level request/response DTOs

mod client;
mod transport;
mod types;

pub use client::HttpProcessorClient;
pub use transport::ApiTransport;
