//! Application layer: command handlers orchestrating domain logic over the
//! ports.

pub mod handlers;
