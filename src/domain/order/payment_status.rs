//! Local order payment status state machine.
//!
//! The local status shadows the processor invoice state. The guarantee this
//! machine enforces is monotonicity: an order never regresses to an earlier
//! state, no matter how webhooks are ordered or duplicated.

use crate::domain::foundation::StateMachine;
use crate::domain::invoice::InvoiceState;
use serde::{Deserialize, Serialize};

/// Payment status recorded on the local order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    /// Awaiting a payment result.
    Pending,

    /// Funds are held; eligible for capture.
    Authorized,

    /// Payment captured; the order is paid.
    Settled,

    /// Payment voided.
    Cancelled,

    /// Payment attempt failed.
    Failed,
}

impl OrderPaymentStatus {
    /// Maps a processor invoice state onto the local status.
    pub fn from_invoice_state(state: InvoiceState) -> Self {
        match state {
            InvoiceState::Created | InvoiceState::Pending => OrderPaymentStatus::Pending,
            InvoiceState::Authorized => OrderPaymentStatus::Authorized,
            InvoiceState::Settled => OrderPaymentStatus::Settled,
            InvoiceState::Cancelled => OrderPaymentStatus::Cancelled,
            InvoiceState::Failed => OrderPaymentStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Pending => "pending",
            OrderPaymentStatus::Authorized => "authorized",
            OrderPaymentStatus::Settled => "settled",
            OrderPaymentStatus::Cancelled => "cancelled",
            OrderPaymentStatus::Failed => "failed",
        }
    }
}

impl StateMachine for OrderPaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderPaymentStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Authorized)
                | (Pending, Settled)
                | (Pending, Cancelled)
                | (Pending, Failed)
            // From AUTHORIZED
                | (Authorized, Settled)
                | (Authorized, Cancelled)
                | (Authorized, Failed)
            // From SETTLED (further partial captures)
                | (Settled, Settled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderPaymentStatus::*;
        match self {
            Pending => vec![Authorized, Settled, Cancelled, Failed],
            Authorized => vec![Settled, Cancelled, Failed],
            Settled => vec![Settled],
            Cancelled => vec![],
            Failed => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_authorize_settle_cancel_or_fail() {
        let status = OrderPaymentStatus::Pending;
        assert!(status.can_transition_to(&OrderPaymentStatus::Authorized));
        assert!(status.can_transition_to(&OrderPaymentStatus::Settled));
        assert!(status.can_transition_to(&OrderPaymentStatus::Cancelled));
        assert!(status.can_transition_to(&OrderPaymentStatus::Failed));
    }

    #[test]
    fn settled_never_regresses() {
        let status = OrderPaymentStatus::Settled;
        assert!(!status.can_transition_to(&OrderPaymentStatus::Authorized));
        assert!(!status.can_transition_to(&OrderPaymentStatus::Pending));
        assert!(!status.can_transition_to(&OrderPaymentStatus::Cancelled));
    }

    #[test]
    fn settled_allows_repeat_settles() {
        assert!(OrderPaymentStatus::Settled.can_transition_to(&OrderPaymentStatus::Settled));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(OrderPaymentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn maps_invoice_states_onto_local_statuses() {
        assert_eq!(
            OrderPaymentStatus::from_invoice_state(InvoiceState::Authorized),
            OrderPaymentStatus::Authorized
        );
        assert_eq!(
            OrderPaymentStatus::from_invoice_state(InvoiceState::Created),
            OrderPaymentStatus::Pending
        );
        assert_eq!(
            OrderPaymentStatus::from_invoice_state(InvoiceState::Settled),
            OrderPaymentStatus::Settled
        );
    }
}
