//! Instant-settle calculator.
//!
//! Pure function partitioning an order's lines by the merchant's settle
//! policy and computing the amount eligible for capture at authorization
//! time. Determinism matters: the same order and policy must always yield
//! the same amount and classification, because both the automatic
//! post-authorization settle and the manual partial-capture UI rely on it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::{LineCategory, OrderRecord};

use super::SettlePolicy;

/// A line eligible for settlement, in the shape the processor expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleLine {
    /// Local order line id; `None` for synthetic lines (shipping).
    pub line_id: Option<String>,

    pub description: String,

    pub quantity: u32,

    /// Unit amount in minor units.
    pub unit_amount: i64,

    pub vat_rate: Decimal,

    pub amount_includes_vat: bool,
}

impl SettleLine {
    pub fn total(&self) -> i64 {
        self.unit_amount * i64::from(self.quantity)
    }
}

/// Result of the instant-settle calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantSettle {
    /// Settle amount in minor units, floored at zero.
    pub amount: i64,

    /// Lines contributing to the amount, in order-line order.
    pub lines: Vec<SettleLine>,

    /// Whether any line matched the policy at all.
    pub would_settle: bool,
}

/// Walks the order lines once and computes the instant-settle amount.
///
/// A line contributes if its category is enabled in the policy. The
/// shipping total (with tax) contributes under the physical category; the
/// total order discount (incl. tax) is always subtracted and the result is
/// floored at zero.
pub fn calculate_instant_settle(order: &OrderRecord, policy: &SettlePolicy) -> InstantSettle {
    let mut lines = Vec::new();
    let mut total: i64 = 0;

    for line in &order.lines {
        if policy.allows(line.category) {
            total += line.total();
            lines.push(SettleLine {
                line_id: Some(line.id.clone()),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_amount: line.unit_amount,
                vat_rate: line.vat_rate,
                amount_includes_vat: line.amount_includes_vat,
            });
        }
    }

    let shipping = order.shipping_total + order.shipping_tax;
    if shipping > 0 && policy.allows(LineCategory::Physical) {
        total += shipping;
        lines.push(SettleLine {
            line_id: None,
            description: "Shipping".to_string(),
            quantity: 1,
            unit_amount: shipping,
            vat_rate: Decimal::ZERO,
            amount_includes_vat: true,
        });
    }

    let would_settle = !lines.is_empty();
    let amount = (total - order.discount_total).max(0);

    InstantSettle {
        amount,
        lines,
        would_settle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CustomerHandle, OrderId};
    use crate::domain::order::OrderLine;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(id: &str, category: LineCategory, unit_amount: i64, quantity: u32) -> OrderLine {
        OrderLine {
            id: id.to_string(),
            description: format!("Line {}", id),
            quantity,
            unit_amount,
            vat_rate: dec!(0.25),
            amount_includes_vat: true,
            category,
        }
    }

    fn order(lines: Vec<OrderLine>) -> OrderRecord {
        let total = lines.iter().map(|l| l.total()).sum();
        OrderRecord::new(
            OrderId::new(1),
            CustomerHandle::new("cust-1").unwrap(),
            "DKK",
            total,
            lines,
        )
    }

    #[test]
    fn single_physical_line_settles_fully_under_physical_policy() {
        // Order total 100.00 DKK, one physical line, no shipping/fee/discount.
        let order = order(vec![line("a", LineCategory::Physical, 10000, 1)]);
        let policy = SettlePolicy::new([LineCategory::Physical]);

        let result = calculate_instant_settle(&order, &policy);

        assert_eq!(result.amount, 10000);
        assert!(result.would_settle);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].line_id.as_deref(), Some("a"));
    }

    #[test]
    fn disabled_categories_do_not_contribute() {
        let order = order(vec![
            line("a", LineCategory::Physical, 10000, 1),
            line("b", LineCategory::Virtual, 5000, 1),
        ]);
        let policy = SettlePolicy::new([LineCategory::Virtual]);

        let result = calculate_instant_settle(&order, &policy);

        assert_eq!(result.amount, 5000);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].line_id.as_deref(), Some("b"));
    }

    #[test]
    fn shipping_contributes_under_physical_category() {
        let mut order = order(vec![line("a", LineCategory::Physical, 10000, 1)]);
        order.shipping_total = 4900;
        order.shipping_tax = 100;

        let physical = SettlePolicy::new([LineCategory::Physical]);
        let result = calculate_instant_settle(&order, &physical);
        assert_eq!(result.amount, 15000);
        assert_eq!(result.lines.len(), 2);

        let virtual_only = SettlePolicy::new([LineCategory::Virtual]);
        let result = calculate_instant_settle(&order, &virtual_only);
        assert_eq!(result.amount, 0);
        assert!(!result.would_settle);
    }

    #[test]
    fn fee_lines_contribute_under_fee_category() {
        let order = order(vec![
            line("a", LineCategory::Physical, 10000, 1),
            line("fee", LineCategory::Fee, 250, 1),
        ]);
        let policy = SettlePolicy::new([LineCategory::Fee]);

        let result = calculate_instant_settle(&order, &policy);

        assert_eq!(result.amount, 250);
    }

    #[test]
    fn discount_always_reduces_the_total() {
        let mut order = order(vec![line("a", LineCategory::Physical, 10000, 1)]);
        order.discount_total = 2500;
        let policy = SettlePolicy::new([LineCategory::Physical]);

        let result = calculate_instant_settle(&order, &policy);

        assert_eq!(result.amount, 7500);
    }

    #[test]
    fn amount_is_floored_at_zero() {
        let mut order = order(vec![line("a", LineCategory::Physical, 1000, 1)]);
        order.discount_total = 5000;
        let policy = SettlePolicy::new([LineCategory::Physical]);

        let result = calculate_instant_settle(&order, &policy);

        assert_eq!(result.amount, 0);
        // Lines still classified even when the discount swallows the total.
        assert!(result.would_settle);
    }

    #[test]
    fn empty_policy_settles_nothing() {
        let order = order(vec![line("a", LineCategory::Physical, 10000, 1)]);
        let result = calculate_instant_settle(&order, &SettlePolicy::none());
        assert_eq!(result.amount, 0);
        assert!(!result.would_settle);
        assert!(result.lines.is_empty());
    }

    fn arb_category() -> impl Strategy<Value = LineCategory> {
        prop_oneof![
            Just(LineCategory::Physical),
            Just(LineCategory::Virtual),
            Just(LineCategory::Recurring),
            Just(LineCategory::Fee),
        ]
    }

    fn arb_order() -> impl Strategy<Value = OrderRecord> {
        (
            prop::collection::vec((arb_category(), 1u32..5, 1i64..100_000), 0..8),
            0i64..10_000,
            0i64..50_000,
        )
            .prop_map(|(specs, shipping, discount)| {
                let lines: Vec<OrderLine> = specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (category, quantity, unit_amount))| {
                        line(&format!("l{}", i), category, unit_amount, quantity)
                    })
                    .collect();
                let mut order = order(lines);
                order.shipping_total = shipping;
                order.discount_total = discount;
                order
            })
    }

    proptest! {
        // Same order + same policy always yields the same output.
        #[test]
        fn calculation_is_deterministic(order in arb_order()) {
            let policy = SettlePolicy::new([LineCategory::Physical, LineCategory::Fee]);
            let first = calculate_instant_settle(&order, &policy);
            let second = calculate_instant_settle(&order, &policy);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn amount_is_never_negative(order in arb_order()) {
            let policy = SettlePolicy::new([
                LineCategory::Physical,
                LineCategory::Virtual,
                LineCategory::Recurring,
                LineCategory::Fee,
            ]);
            let result = calculate_instant_settle(&order, &policy);
            prop_assert!(result.amount >= 0);
        }
    }
}
