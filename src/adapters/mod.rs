//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `stripe` - `PaymentProvider` over the Stripe REST API, plus an in-memory mock
//! - `http` - axum routers exposing the gateway and storefront endpoints

pub mod http;
pub mod stripe;
