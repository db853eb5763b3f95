//! HTTP adapter for the jewelry storefront's checkout.
//!
//! - `POST /api/create-payment-intent` - Charge the submitted cart
//! - `GET /api/health` - Liveness and Stripe configuration

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::storefront_routes;
