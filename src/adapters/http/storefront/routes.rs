//! Axum router for the storefront checkout endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{create_payment_intent, health};

/// Create the storefront router. Always mounted, whatever the Stripe setting.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/health", get(health))
}
