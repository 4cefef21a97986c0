//! Idempotent application of processor invoice state to a local order.
//!
//! Every caller that learns about a new invoice state (synchronous charge
//! result, capture result, webhook) funnels it through here, so replays and
//! races collapse into no-ops instead of double side effects.

use crate::domain::foundation::StateMachine;
use crate::domain::order::{OrderPaymentStatus, OrderRecord};

/// Outcome of applying an invoice state to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The order moved to the new status.
    Applied,

    /// The order was already at (or past) the status; nothing changed.
    AlreadyApplied,

    /// The transition is not valid from the order's current status.
    Rejected,
}

/// Applies a payment status learned from the processor to the order.
///
/// Records the transaction id in the slot matching the status. Re-applying
/// the current status is reported as `AlreadyApplied` unless it is a
/// further partial settle carrying a new transaction id.
pub fn apply_invoice_state(
    order: &mut OrderRecord,
    status: OrderPaymentStatus,
    transaction: Option<&str>,
) -> ApplyOutcome {
    let current = order.payment.status;

    if current == status {
        // A settled order can settle again (further partial capture).
        let is_new_partial_settle = status == OrderPaymentStatus::Settled
            && transaction.is_some()
            && order.payment.capture_transaction_id.as_deref() != transaction;
        if !is_new_partial_settle {
            return ApplyOutcome::AlreadyApplied;
        }
    } else if !current.can_transition_to(&status) {
        return ApplyOutcome::Rejected;
    }

    match status {
        OrderPaymentStatus::Authorized => {
            order.payment.transaction_id = transaction.map(str::to_string);
            // Inventory is reduced exactly once, on first authorization.
            if !order.payment.stock_reduced {
                order.payment.stock_reduced = true;
            }
        }
        OrderPaymentStatus::Settled => {
            if let Some(txn) = transaction {
                order.payment.capture_transaction_id = Some(txn.to_string());
            }
        }
        OrderPaymentStatus::Cancelled => {
            if let Some(txn) = transaction {
                order.payment.cancel_transaction_id = Some(txn.to_string());
            }
        }
        OrderPaymentStatus::Pending | OrderPaymentStatus::Failed => {}
    }

    order.payment.status = status;
    ApplyOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CustomerHandle, OrderId};

    fn order() -> OrderRecord {
        OrderRecord::new(
            OrderId::new(1),
            CustomerHandle::new("cust-1").unwrap(),
            "EUR",
            5000,
            vec![],
        )
    }

    #[test]
    fn authorization_records_transaction_and_stock_guard() {
        let mut order = order();
        let outcome =
            apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(order.payment.status, OrderPaymentStatus::Authorized);
        assert_eq!(order.payment.transaction_id.as_deref(), Some("txn-1"));
        assert!(order.payment.stock_reduced);
    }

    #[test]
    fn replayed_authorization_is_a_no_op() {
        let mut order = order();
        apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));
        let outcome =
            apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));

        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
        assert_eq!(order.payment.transaction_id.as_deref(), Some("txn-1"));
    }

    #[test]
    fn settle_after_authorization_records_capture_transaction() {
        let mut order = order();
        apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));
        let outcome = apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-2"));

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(order.payment.capture_transaction_id.as_deref(), Some("txn-2"));
    }

    #[test]
    fn replayed_settle_with_same_transaction_is_a_no_op() {
        let mut order = order();
        apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));
        apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-2"));
        let outcome = apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-2"));

        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
    }

    #[test]
    fn further_partial_settle_with_new_transaction_applies() {
        let mut order = order();
        apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));
        apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-2"));
        let outcome = apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-3"));

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(order.payment.capture_transaction_id.as_deref(), Some("txn-3"));
    }

    #[test]
    fn backwards_transition_is_rejected() {
        let mut order = order();
        apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-1"));
        apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-2"));
        let outcome = apply_invoice_state(&mut order, OrderPaymentStatus::Authorized, Some("txn-9"));

        assert_eq!(outcome, ApplyOutcome::Rejected);
        assert_eq!(order.payment.status, OrderPaymentStatus::Settled);
    }

    #[test]
    fn terminal_states_reject_everything() {
        let mut order = order();
        apply_invoice_state(&mut order, OrderPaymentStatus::Cancelled, Some("txn-c"));
        let outcome = apply_invoice_state(&mut order, OrderPaymentStatus::Settled, Some("txn-2"));
        assert_eq!(outcome, ApplyOutcome::Rejected);
    }
}
