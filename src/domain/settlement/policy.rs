//! Merchant settle policy.
//!
//! The policy names the line categories eligible for instant settlement at
//! authorization time. Discounts are not a category: the order discount
//! always reduces the settle total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::order::LineCategory;

/// Set of line categories eligible for instant settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlePolicy {
    categories: BTreeSet<LineCategory>,
}

impl SettlePolicy {
    pub fn new(categories: impl IntoIterator<Item = LineCategory>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// Policy that settles nothing instantly.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn allows(&self, category: LineCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
