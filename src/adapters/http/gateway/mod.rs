//! HTTP adapter for the Stripe gateway.
//!
//! Forwards checkout, customer, payment method and subscription calls to the
//! payment provider and receives Stripe webhooks. Mounted under the
//! configured base path (default `/api/stripe`) only when Stripe is enabled.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::SIGNATURE_HEADER;
pub use routes::gateway_routes;
