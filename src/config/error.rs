//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Stripe secret key format")]
    InvalidStripeKey,

    #[error("Invalid Stripe publishable key format")]
    InvalidPublishableKey,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Stripe base path must start with '/' and must not end with '/'")]
    InvalidBasePath,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Shipping rate cannot be negative")]
    NegativeShippingRate,
}
