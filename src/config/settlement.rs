//! Settlement behavior configuration

use serde::Deserialize;

use crate::domain::order::LineCategory;
use crate::domain::settlement::SettlePolicy;

use super::error::ValidationError;

/// Settlement behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Categories settled immediately on authorization (comma-separated:
    /// "physical,virtual,recurring,fee")
    pub instant_settle: Option<String>,

    /// Retry a charge once under a fresh handle when the original handle
    /// collides at the processor
    #[serde(default = "default_handle_failover")]
    pub handle_failover: bool,

    /// Send flat amounts instead of itemized order lines
    #[serde(default)]
    pub skip_order_lines: bool,
}

impl SettlementConfig {
    /// Build the instant-settle policy from the configured category list
    pub fn settle_policy(&self) -> Result<SettlePolicy, ValidationError> {
        let raw = match &self.instant_settle {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(SettlePolicy::none()),
        };

        let mut categories = Vec::new();
        for token in raw.split(',') {
            let token = token.trim();
            let category = match token {
                "physical" => LineCategory::Physical,
                "virtual" => LineCategory::Virtual,
                "recurring" => LineCategory::Recurring,
                "fee" => LineCategory::Fee,
                other => {
                    return Err(ValidationError::UnknownSettleCategory(other.to_string()))
                }
            };
            categories.push(category);
        }
        Ok(SettlePolicy::new(categories))
    }

    /// Validate settlement configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.settle_policy().map(|_| ())
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            instant_settle: None,
            handle_failover: default_handle_failover(),
            skip_order_lines: false,
        }
    }
}

fn default_handle_failover() -> bool {
    true
}
