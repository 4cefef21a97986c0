//! Processor invoice state machine.
//!
//! Mirrors the lifecycle the processor reports for an invoice. The local
//! order status is derived from these states; applying the same state twice
//! is always a no-op at the application layer.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// State of a processor-side invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    /// Invoice exists but no payment attempt has completed yet.
    Created,

    /// Payment is in flight (e.g. awaiting 3-D Secure or async capture).
    Pending,

    /// Funds are held; the invoice can be settled or cancelled.
    Authorized,

    /// Funds captured (fully or partially).
    Settled,

    /// Authorization voided. Terminal.
    Cancelled,

    /// Payment attempt failed. Terminal for this invoice.
    Failed,
}

impl InvoiceState {
    /// Parses the processor's wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(InvoiceState::Created),
            "pending" => Some(InvoiceState::Pending),
            "authorized" => Some(InvoiceState::Authorized),
            "settled" => Some(InvoiceState::Settled),
            "cancelled" => Some(InvoiceState::Cancelled),
            "failed" => Some(InvoiceState::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Created => "created",
            InvoiceState::Pending => "pending",
            InvoiceState::Authorized => "authorized",
            InvoiceState::Settled => "settled",
            InvoiceState::Cancelled => "cancelled",
            InvoiceState::Failed => "failed",
        }
    }
}

impl StateMachine for InvoiceState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use InvoiceState::*;
        matches!(
            (self, target),
            // From CREATED
            (Created, Pending)
                | (Created, Authorized)
                | (Created, Settled) // instant capture without separate auth
                | (Created, Failed)
                | (Created, Cancelled)
            // From PENDING
                | (Pending, Authorized)
                | (Pending, Settled)
                | (Pending, Cancelled)
                | (Pending, Failed)
            // From AUTHORIZED
                | (Authorized, Settled)
                | (Authorized, Cancelled)
                | (Authorized, Failed)
            // From SETTLED (further partial settles)
                | (Settled, Settled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use InvoiceState::*;
        match self {
            Created => vec![Pending, Authorized, Settled, Cancelled, Failed],
            Pending => vec![Authorized, Settled, Cancelled, Failed],
            Authorized => vec![Settled, Cancelled, Failed],
            Settled => vec![Settled],
            Cancelled => vec![],
            Failed => vec![],
        }
    }
}
