//! Stripe client configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::StripeSettings;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    pub(super) api_key: SecretString,

    /// Webhook signing secret (whsec_...). Empty when webhooks are not set up.
    pub(super) webhook_secret: SecretString,

    /// Value of the `Stripe-Version` header.
    pub(super) api_version: String,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    pub(super) api_base_url: String,

    /// Whether to reject test-mode webhook events.
    pub(super) require_livemode: bool,

    /// Per-request timeout.
    pub(super) timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_version: "2024-12-18.acacia".to_string(),
            api_base_url: "https://api.stripe.com".to_string(),
            require_livemode: false,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Require livemode events.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_webhook_secret(&self) -> bool {
        !self.webhook_secret.expose_secret().is_empty()
    }
}

impl From<&StripeSettings> for StripeConfig {
    fn from(settings: &StripeSettings) -> Self {
        Self::new(settings.secret_key.clone(), settings.webhook_secret.clone())
            .with_base_url(settings.api_base_url.clone())
            .with_api_version(settings.api_version.clone())
            .with_require_livemode(settings.require_livemode)
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("api_base_url", &self.api_base_url)
            .field("require_livemode", &self.require_livemode)
            .finish()
    }
}
