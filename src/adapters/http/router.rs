//! Top-level router: storefront routes, the gateway under its base path,
//! and the tower-http middleware stack.

use std::time::Duration;

use axum::Router;
use http::{header, HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use super::gateway::{gateway_routes, SIGNATURE_HEADER};
use super::state::AppState;
use super::storefront::storefront_routes;

/// Build the complete application router.
///
/// Gateway routes are nested under `stripe.base_path` only when Stripe is
/// enabled; the storefront routes are always present.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let mut router = Router::new().merge(storefront_routes());

    if state.stripe.enabled {
        tracing::info!(base_path = %state.stripe.base_path, "Mounting Stripe gateway routes");
        router = router.nest(&state.stripe.base_path, gateway_routes());
    } else {
        tracing::info!("Stripe disabled; gateway routes not mounted");
    }

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(cors_layer(server));

    router.with_state(state).layer(middleware)
}

/// CORS from the configured origin list; any origin when none is configured.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(SIGNATURE_HEADER),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::stripe::MockPaymentProvider;
    use crate::application::WebhookRegistry;
    use crate::config::{ShopConfig, StripeSettings};

    fn router(enabled: bool, server: &ServerConfig) -> Router {
        let stripe = StripeSettings {
            enabled,
            secret_key: "sk_test_123".to_string(),
            publishable_key: "pk_test_456".to_string(),
            ..Default::default()
        };
        let state = AppState::new(
            Arc::new(MockPaymentProvider::new()),
            Arc::new(WebhookRegistry::new()),
            stripe,
            ShopConfig::default(),
        );
        build_router(state, server)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn gateway_is_nested_under_base_path() {
        let app = router(true, &ServerConfig::default());

        let response = app.oneshot(get("/api/stripe/config")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn gateway_is_absent_when_disabled() {
        let app = router(false, &ServerConfig::default());

        let response = app.oneshot(get("/api/stripe/config")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn storefront_routes_are_always_mounted() {
        let app = router(false, &ServerConfig::default());

        let response = app.oneshot(get("/api/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = router(true, &ServerConfig::default());

        let response = app.oneshot(get("/api/health")).await.unwrap();

        let id = response.headers().get("x-request-id").unwrap();
        assert!(uuid::Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn incoming_request_id_is_kept() {
        let app = router(true, &ServerConfig::default());
        let request = Request::builder()
            .uri("/api/health")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let server = ServerConfig {
            cors_origins: Some("https://shop.test, not a header\u{7f}".to_string()),
            ..Default::default()
        };
        let app = router(true, &server);
        let request = Request::builder()
            .uri("/api/health")
            .header("origin", "https://shop.test")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://shop.test"
        );
    }
}
