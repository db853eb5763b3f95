//! HTTP adapters - REST API implementations.
//!
//! - `gateway` - Stripe checkout, customers, payment methods, subscriptions,
//!   webhooks and config, nested under the configured base path
//! - `storefront` - payment intent and health endpoints for the shop front end
//!
//! Both routers share one [`AppState`] and report failures through [`ApiError`].

pub mod error;
pub mod gateway;
pub mod router;
pub mod state;
pub mod storefront;

pub use error::{ApiError, ErrorResponse};
pub use gateway::gateway_routes;
pub use router::build_router;
pub use state::AppState;
pub use storefront::storefront_routes;
