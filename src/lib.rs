//! Paybridge - Payment Settlement & Reconciliation Engine
//!
//! This crate keeps a storefront's local order records consistent with an
//! external payment processor's asynchronous view of payment state: charging,
//! settling, cancelling and refunding invoices over the processor HTTP API,
//! and reconciling processor webhooks idempotently.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
