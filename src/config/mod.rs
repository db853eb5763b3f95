//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `STOREFRONT_PAYMENTS` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use storefront_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.host);
//! ```

mod error;
mod payment;
mod server;
mod shop;

pub use error::{ConfigError, ValidationError};
pub use payment::StripeSettings;
pub use server::{Environment, ServerConfig};
pub use shop::ShopConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Stripe configuration
    #[serde(default)]
    pub stripe: StripeSettings,

    /// Storefront checkout settings
    #[serde(default)]
    pub shop: ShopConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `STOREFRONT_PAYMENTS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `STOREFRONT_PAYMENTS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `STOREFRONT_PAYMENTS__STRIPE__SECRET_KEY=...` -> `stripe.secret_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STOREFRONT_PAYMENTS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    ///
    /// A Stripe section that is enabled without a secret key fails here, which
    /// the binary treats as fatal.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.stripe.validate()?;
        self.shop.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
