//! Payment configuration (Stripe)

use serde::Deserialize;

use super::error::ValidationError;

/// Stripe configuration section.
///
/// When `enabled` is false the gateway routes are not mounted and every other
/// field is ignored. When enabled, a secret key is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSettings {
    /// Enable Stripe payment processing
    #[serde(default)]
    pub enabled: bool,

    /// Stripe secret API key (sk_live_... / sk_test_... / rk_...)
    #[serde(default)]
    pub secret_key: String,

    /// Stripe publishable key handed to browsers (pk_...)
    #[serde(default)]
    pub publishable_key: String,

    /// Webhook signing secret (whsec_...)
    #[serde(default)]
    pub webhook_secret: String,

    /// Stripe API version sent with every request
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Path prefix the gateway routes are mounted under
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Reject test-mode webhook events
    #[serde(default)]
    pub require_livemode: bool,
}

impl StripeSettings {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_") || self.secret_key.starts_with("rk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_") || self.secret_key.starts_with("rk_live_")
    }

    /// Whether webhook verification can be performed at all
    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.is_empty()
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }

        if self.secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_SECRET_KEY"));
        }
        if !(self.secret_key.starts_with("sk_") || self.secret_key.starts_with("rk_")) {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.publishable_key.is_empty() && !self.publishable_key.starts_with("pk_") {
            return Err(ValidationError::InvalidPublishableKey);
        }
        if self.has_webhook_secret() && !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.base_path.starts_with('/') || self.base_path.ends_with('/') {
            return Err(ValidationError::InvalidBasePath);
        }

        Ok(())
    }
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_key: String::new(),
            publishable_key: String::new(),
            webhook_secret: String::new(),
            api_version: default_api_version(),
            api_base_url: default_api_base_url(),
            base_path: default_base_path(),
            require_livemode: false,
        }
    }
}

fn default_api_version() -> String {
    "2024-12-18.acacia".to_string()
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_base_path() -> String {
    "/api/stripe".to_string()
}
