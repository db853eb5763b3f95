//! Axum router for the Stripe gateway endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{
    attach_payment_method, cancel_subscription, create_checkout_session, create_customer,
    create_subscription, delete_customer, detach_payment_method, expire_checkout_session,
    get_checkout_session, get_config, get_customer, get_subscription, handle_webhook,
    list_customer_subscriptions, list_payment_methods, resume_subscription, update_customer,
    update_subscription,
};

/// Create the gateway router, relative to the configured base path.
///
/// # Routes
///
/// - `POST /checkout/sessions` - Create checkout session
/// - `GET /checkout/sessions/:id` - Get checkout session
/// - `POST /checkout/sessions/:id/expire` - Expire checkout session
/// - `POST /customers` - Create customer
/// - `GET|PUT|DELETE /customers/:id` - Get, update or delete customer
/// - `GET /customers/:id/payment-methods` - List payment methods
/// - `POST /payment-methods/attach` - Attach payment method
/// - `POST /payment-methods/detach` - Detach payment method
/// - `POST /subscriptions` - Create subscription
/// - `GET|PUT /subscriptions/:id` - Get or update subscription
/// - `GET /subscriptions/customer/:id` - List customer subscriptions
/// - `POST /subscriptions/:id/cancel` - Cancel subscription
/// - `POST /subscriptions/:id/resume` - Resume subscription
/// - `POST /webhooks` - Stripe webhook receiver
/// - `GET /config` - Publishable key
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout/sessions", post(create_checkout_session))
        .route("/checkout/sessions/:id", get(get_checkout_session))
        .route("/checkout/sessions/:id/expire", post(expire_checkout_session))
        .route("/customers", post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/:id/payment-methods", get(list_payment_methods))
        .route("/payment-methods/attach", post(attach_payment_method))
        .route("/payment-methods/detach", post(detach_payment_method))
        .route("/subscriptions", post(create_subscription))
        .route(
            "/subscriptions/:id",
            get(get_subscription).put(update_subscription),
        )
        .route(
            "/subscriptions/customer/:id",
            get(list_customer_subscriptions),
        )
        .route("/subscriptions/:id/cancel", post(cancel_subscription))
        .route("/subscriptions/:id/resume", post(resume_subscription))
        .route("/webhooks", post(handle_webhook))
        .route("/config", get(get_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::stripe::MockPaymentProvider;
    use crate::application::WebhookRegistry;
    use crate::config::{ShopConfig, StripeSettings};
    use crate::domain::webhook::WebhookEventType;
    use crate::ports::{
        FnHandler, PaymentError, PaymentMethod, PaymentMethodKind, SubscriptionStatus,
        WebhookHandler, WebhookHandlerError,
    };

    // ───────────────────────────────────────────────────────────────
    // Helpers
    // ───────────────────────────────────────────────────────────────

    fn settings() -> StripeSettings {
        StripeSettings {
            enabled: true,
            secret_key: "sk_test_123".to_string(),
            publishable_key: "pk_test_456".to_string(),
            webhook_secret: "whsec_789".to_string(),
            ..Default::default()
        }
    }

    fn app_with(mock: &MockPaymentProvider, registry: Arc<WebhookRegistry>) -> Router {
        let state = AppState::new(
            Arc::new(mock.clone()),
            registry,
            settings(),
            ShopConfig::default(),
        );
        gateway_routes().with_state(state)
    }

    fn app(mock: &MockPaymentProvider) -> Router {
        app_with(mock, Arc::new(WebhookRegistry::new()))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn webhook_request(signature: Option<&str>) -> Request<Body> {
        let event = MockPaymentProvider::checkout_completed_event("cs_1", "cus_1");
        let mut builder = Request::builder().method("POST").uri("/webhooks");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        builder
            .body(Body::from(serde_json::to_vec(&event).unwrap()))
            .unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Checkout
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_checkout_session_returns_summary() {
        let mock = MockPaymentProvider::new();
        let body = json!({
            "mode": "payment",
            "lineItems": [{ "price": "price_ring", "quantity": 2 }],
            "successUrl": "https://shop.test/ok",
            "cancelUrl": "https://shop.test/cancel"
        });

        let response = app(&mock)
            .oneshot(json_request("POST", "/checkout/sessions", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["id"].as_str().unwrap().starts_with("cs_"));
        assert_eq!(json["status"], "open");
        assert!(mock.was_called("create_checkout_session"));
    }

    #[tokio::test]
    async fn malformed_checkout_body_is_bad_request() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock)
            .oneshot(json_request("POST", "/checkout/sessions", json!({ "mode": "payment" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");
        assert!(!mock.was_called("create_checkout_session"));
    }

    #[tokio::test]
    async fn expire_unknown_session_is_provider_error() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock)
            .oneshot(empty_request("POST", "/checkout/sessions/cs_missing/expire"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "PAYMENT_PROVIDER_ERROR");
        assert!(json["error"].as_str().is_some());
    }

    // ───────────────────────────────────────────────────────────────
    // Customers & payment methods
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn customer_lifecycle() {
        let mock = MockPaymentProvider::new();

        let created = app(&mock)
            .oneshot(json_request(
                "POST",
                "/customers",
                json!({ "email": "ada@shop.test", "name": "Ada" }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);
        let customer = body_json(created).await;
        let id = customer["id"].as_str().unwrap().to_string();
        assert_eq!(customer["email"], "ada@shop.test");

        let updated = app(&mock)
            .oneshot(json_request(
                "PUT",
                &format!("/customers/{}", id),
                json!({ "name": "Ada Lovelace" }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(updated).await["name"], "Ada Lovelace");

        let deleted = app(&mock)
            .oneshot(empty_request("DELETE", &format!("/customers/{}", id)))
            .await
            .unwrap();
        assert_eq!(body_json(deleted).await, json!({ "id": id, "deleted": true }));
    }

    #[tokio::test]
    async fn missing_customer_is_internal_error_with_message() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock)
            .oneshot(empty_request("GET", "/customers/cus_gone"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Customer not found");
    }

    #[tokio::test]
    async fn list_payment_methods_wraps_data_and_passes_type() {
        let mock = MockPaymentProvider::new();
        mock.add_payment_method(PaymentMethod {
            id: "pm_bank".to_string(),
            kind: "us_bank_account".to_string(),
            customer: Some("cus_1".to_string()),
            card: None,
            created: 0,
        });

        let response = app(&mock)
            .oneshot(empty_request(
                "GET",
                "/customers/cus_1/payment-methods?type=us_bank_account",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"][0]["id"], "pm_bank");
        assert_eq!(json["data"][0]["type"], "us_bank_account");

        let call = mock
            .calls()
            .into_iter()
            .find(|c| c.method == "list_payment_methods")
            .unwrap();
        assert_eq!(call.args, vec!["cus_1", PaymentMethodKind::UsBankAccount.as_str()]);
    }

    #[tokio::test]
    async fn attach_and_detach_payment_method() {
        let mock = MockPaymentProvider::with_active_subscription("cus_1", "sub_1");
        mock.add_payment_method(PaymentMethod {
            id: "pm_card".to_string(),
            kind: "card".to_string(),
            customer: None,
            card: None,
            created: 0,
        });

        let attached = app(&mock)
            .oneshot(json_request(
                "POST",
                "/payment-methods/attach",
                json!({ "paymentMethodId": "pm_card", "customerId": "cus_1" }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(attached).await["customer"], "cus_1");

        let detached = app(&mock)
            .oneshot(json_request(
                "POST",
                "/payment-methods/detach",
                json!({ "paymentMethodId": "pm_card" }),
            ))
            .await
            .unwrap();
        assert!(body_json(detached).await["customer"].is_null());
    }

    // ───────────────────────────────────────────────────────────────
    // Subscriptions
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn cancel_without_body_waits_for_period_end() {
        let mock = MockPaymentProvider::with_active_subscription("cus_1", "sub_1");

        let response = app(&mock)
            .oneshot(empty_request("POST", "/subscriptions/sub_1/cancel"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["cancel_at_period_end"], true);
        assert_eq!(json["status"], "active");
    }

    #[tokio::test]
    async fn cancel_with_invalid_body_is_rejected_and_leaves_subscription_alone() {
        let mock = MockPaymentProvider::with_active_subscription("cus_1", "sub_1");
        let invalid = [
            Body::from(json!({ "immediate": "true" }).to_string()),
            Body::from("{\"immediate\": tru"),
        ];

        for body in invalid {
            let request = Request::builder()
                .method("POST")
                .uri("/subscriptions/sub_1/cancel")
                .header("content-type", "application/json")
                .body(body)
                .unwrap();

            let response = app(&mock).oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");
        }

        assert!(!mock.was_called("cancel_subscription"));
        let current = app(&mock)
            .oneshot(empty_request("GET", "/subscriptions/sub_1"))
            .await
            .unwrap();
        assert_eq!(body_json(current).await["cancel_at_period_end"], false);
    }

    #[tokio::test]
    async fn cancel_immediately_then_list_by_status() {
        let mock = MockPaymentProvider::with_active_subscription("cus_1", "sub_1");

        let response = app(&mock)
            .oneshot(json_request(
                "POST",
                "/subscriptions/sub_1/cancel",
                json!({ "immediate": true }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "canceled");

        let listed = app(&mock)
            .oneshot(empty_request(
                "GET",
                "/subscriptions/customer/cus_1?status=canceled",
            ))
            .await
            .unwrap();
        let json = body_json(listed).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["id"], "sub_1");
    }

    #[tokio::test]
    async fn resume_clears_pending_cancel() {
        let mock = MockPaymentProvider::with_active_subscription("cus_1", "sub_1");
        let _ = app(&mock)
            .oneshot(empty_request("POST", "/subscriptions/sub_1/cancel"))
            .await
            .unwrap();

        let response = app(&mock)
            .oneshot(empty_request("POST", "/subscriptions/sub_1/resume"))
            .await
            .unwrap();

        assert_eq!(body_json(response).await["cancel_at_period_end"], false);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_bad_request() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock)
            .oneshot(empty_request("GET", "/subscriptions/customer/cus_1?status=bogus"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!mock.was_called("list_customer_subscriptions"));
    }

    #[tokio::test]
    async fn get_subscription_routes_by_id() {
        let mock = MockPaymentProvider::with_active_subscription("cus_1", "sub_1");

        let response = app(&mock)
            .oneshot(empty_request("GET", "/subscriptions/sub_1"))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["id"], "sub_1");
        assert_eq!(json["status"], SubscriptionStatus::Active.as_str());
    }

    #[tokio::test]
    async fn provider_failure_surfaces_message() {
        let mock = MockPaymentProvider::new();
        mock.set_method_error(
            "create_subscription",
            PaymentError::invalid_request("No such price: 'price_x'"),
        );

        let response = app(&mock)
            .oneshot(json_request(
                "POST",
                "/subscriptions",
                json!({ "customerId": "cus_1", "items": [{ "price": "price_x" }] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "No such price: 'price_x'");
    }

    // ───────────────────────────────────────────────────────────────
    // Webhooks & config
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn webhook_without_signature_is_rejected() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock).oneshot(webhook_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing stripe-signature header"
        );
        assert!(!mock.was_called("construct_webhook_event"));
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_is_rejected() {
        let mock = MockPaymentProvider::rejecting_webhooks();

        let response = app(&mock)
            .oneshot(webhook_request(Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid webhook signature");
    }

    #[tokio::test]
    async fn webhook_without_secret_is_bad_request() {
        let mock = MockPaymentProvider::without_webhook_secret();

        let response = app(&mock)
            .oneshot(webhook_request(Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "WEBHOOK_SECRET_MISSING");
    }

    #[tokio::test]
    async fn webhook_is_dispatched_and_acknowledged() {
        let mock = MockPaymentProvider::new();
        let registry = Arc::new(WebhookRegistry::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        let handler: Arc<dyn WebhookHandler> = Arc::new(FnHandler::new("count", move |_| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }));
        registry.register(WebhookEventType::CheckoutSessionCompleted, handler);

        let response = app_with(&mock, registry)
            .oneshot(webhook_request(Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "received": true }));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn webhook_with_no_handlers_is_acknowledged() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock)
            .oneshot(webhook_request(Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn failing_webhook_handler_is_internal_error() {
        let mock = MockPaymentProvider::new();
        let registry = Arc::new(WebhookRegistry::new());
        let handler: Arc<dyn WebhookHandler> = Arc::new(FnHandler::new("fulfil", |_| {
            Box::pin(async { Err(WebhookHandlerError::new("warehouse offline")) })
        }));
        registry.register(WebhookEventType::CheckoutSessionCompleted, handler);

        let response = app_with(&mock, registry)
            .oneshot(webhook_request(Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "WEBHOOK_HANDLER_FAILED");
        assert!(json["error"].as_str().unwrap().contains("warehouse offline"));
    }

    #[tokio::test]
    async fn config_returns_publishable_key() {
        let mock = MockPaymentProvider::new();

        let response = app(&mock)
            .oneshot(empty_request("GET", "/config"))
            .await
            .unwrap();

        assert_eq!(
            body_json(response).await,
            json!({ "publishableKey": "pk_test_456" })
        );
    }
}
