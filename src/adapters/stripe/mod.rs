//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe integration, including:
//! - Checkout sessions
//! - Customers and payment methods
//! - Subscription lifecycle
//! - Payment intents for the storefront checkout
//! - Webhook signature verification
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - All secrets are handled via `secrecy::SecretString`

mod adapter;
mod client;
mod config;
mod form;
mod mock_payment_provider;
mod signature;
mod types;

pub use adapter::StripePaymentAdapter;
pub use client::StripeClient;
pub use config::StripeConfig;
pub use form::FormParams;
pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use signature::{
    sign_payload, SignatureHeader, SignatureParseError, WebhookVerifier,
    MAX_FUTURE_TOLERANCE_SECS, MAX_TIMESTAMP_AGE_SECS,
};
