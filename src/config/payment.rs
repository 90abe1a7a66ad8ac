//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

fn default_currency() -> String {
    "eur".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Currency recorded for donation-based entries
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Upper bound in seconds for any single provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if self.default_currency.len() != 3
            || !self.default_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::InvalidCurrency);
        }

        Ok(())
    }
}
