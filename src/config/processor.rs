//! Payment processor configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment processor API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Live mode private API key
    #[serde(default)]
    pub live_private_key: String,

    /// Test mode private API key
    #[serde(default)]
    pub test_private_key: String,

    /// Run against the test environment
    #[serde(default = "default_test_mode")]
    pub test_mode: bool,

    /// Base URL of the processor REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Secret used to verify webhook signatures
    #[serde(default)]
    pub webhook_secret: String,

    /// Log every API request/response at debug level
    #[serde(default)]
    pub debug_logging: bool,

    /// Publicly reachable webhook URL registered with the processor at
    /// startup. Registration is skipped when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl ProcessorConfig {
    /// The private key for the currently selected mode
    pub fn active_private_key(&self) -> &str {
        if self.test_mode {
            &self.test_private_key
        } else {
            &self.live_private_key
        }
    }

    /// Validate processor configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.active_private_key().is_empty() {
            return Err(ValidationError::MissingRequired(
                "PROCESSOR private key for the active mode",
            ));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingWebhookSecret);
        }
        Ok(())
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            live_private_key: String::new(),
            test_private_key: String::new(),
            test_mode: default_test_mode(),
            api_base_url: default_api_base_url(),
            webhook_secret: String::new(),
            debug_logging: false,
            webhook_url: None,
        }
    }
}

fn default_test_mode() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://api.example-processor.com".to_string()
}
