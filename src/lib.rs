//! Storefront Payments - Stripe payment gateway for the jewelry storefront
//!
//! Forwards checkout sessions, customers, payment methods and subscriptions to
//! Stripe over HTTP, verifies incoming webhooks and fans them out to registered
//! handlers, and opens payment intents for the storefront cart.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
