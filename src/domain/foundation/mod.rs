//! Foundation types shared by every domain module.

mod errors;
mod ids;
mod state_machine;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CustomerHandle, OrderId};
pub use state_machine::StateMachine;
