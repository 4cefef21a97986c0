//! Minor-unit amount conversion.
//!
//! The processor expects amounts in the minor currency unit (typically
//! major x 100). Zero-decimal currencies have no minor unit, so their
//! multiplier is 1.

use once_cell::sync::Lazy;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;

/// Currencies without a minor unit (ISO 4217 exponent 0).
static ZERO_DECIMAL_CURRENCIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND",
        "VUV", "XAF", "XOF", "XPF",
    ]
    .into_iter()
    .collect()
});

/// Minor-unit multiplier for a currency.
pub fn multiplier(currency: &str) -> i64 {
    if ZERO_DECIMAL_CURRENCIES.contains(currency.to_ascii_uppercase().as_str()) {
        1
    } else {
        100
    }
}

/// Converts a major-unit amount to the processor's minor unit.
///
/// Rounds half-up to the nearest minor unit. Returns `None` when the
/// result does not fit in an `i64` (absurd amounts only).
pub fn prepare_amount(major: Decimal, currency: &str) -> Option<i64> {
    let minor = (major * Decimal::from(multiplier(currency)))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    minor.to_i64()
}

/// Converts a minor-unit amount back to major units.
pub fn make_initial_amount(minor: i64, currency: &str) -> Decimal {
    Decimal::from(minor) / Decimal::from(multiplier(currency))
}
