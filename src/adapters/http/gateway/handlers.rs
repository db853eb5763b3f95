//! HTTP handlers for the Stripe gateway endpoints.
//!
//! Each handler forwards to the `PaymentProvider` port and returns the
//! result as JSON. Provider failures surface as 500 with the provider's
//! message.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::response::IntoResponse;
use http::HeaderMap;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::AppState;
use crate::application::{DispatchOutcome, ProcessWebhookCommand};
use crate::ports::SubscriptionStatus;

use super::dto::{
    AttachPaymentMethodRequest, CancelSubscriptionRequest, CreateCheckoutSessionRequest,
    CreateCustomerRequest, CreateSubscriptionRequest, DeletedResponse,
    DetachPaymentMethodRequest, ListPaymentMethodsQuery, ListResponse, ListSubscriptionsQuery,
    PublishableKeyResponse, UpdateCustomerRequest, UpdateSubscriptionRequest,
    WebhookReceivedResponse,
};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Checkout Sessions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /checkout/sessions - Create a hosted checkout session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Result<Json<CreateCheckoutSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let session = state
        .payment_provider
        .create_checkout_session(request.into())
        .await?;
    Ok(Json(session))
}

/// GET /checkout/sessions/:id
pub async fn get_checkout_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .payment_provider
        .get_checkout_session(&session_id)
        .await?;
    Ok(Json(session))
}

/// POST /checkout/sessions/:id/expire
pub async fn expire_checkout_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .payment_provider
        .expire_checkout_session(&session_id)
        .await?;
    Ok(Json(session))
}

// ════════════════════════════════════════════════════════════════════════════════
// Customers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    body: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let customer = state.payment_provider.create_customer(request.into()).await?;
    Ok(Json(customer))
}

/// GET /customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.payment_provider.get_customer(&customer_id).await?;
    Ok(Json(customer))
}

/// PUT /customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    body: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let customer = state
        .payment_provider
        .update_customer(&customer_id, request.into())
        .await?;
    Ok(Json(customer))
}

/// DELETE /customers/:id
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.payment_provider.delete_customer(&customer_id).await?;
    Ok(Json(DeletedResponse {
        id: customer_id,
        deleted: true,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Methods
// ════════════════════════════════════════════════════════════════════════════════

/// GET /customers/:id/payment-methods?type=card|us_bank_account
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    query: Result<Query<ListPaymentMethodsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let methods = state
        .payment_provider
        .list_payment_methods(&customer_id, query.kind)
        .await?;
    Ok(Json(ListResponse { data: methods }))
}

/// POST /payment-methods/attach
pub async fn attach_payment_method(
    State(state): State<AppState>,
    body: Result<Json<AttachPaymentMethodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let method = state
        .payment_provider
        .attach_payment_method(&request.payment_method_id, &request.customer_id)
        .await?;
    Ok(Json(method))
}

/// POST /payment-methods/detach
pub async fn detach_payment_method(
    State(state): State<AppState>,
    body: Result<Json<DetachPaymentMethodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let method = state
        .payment_provider
        .detach_payment_method(&request.payment_method_id)
        .await?;
    Ok(Json(method))
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    body: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let subscription = state
        .payment_provider
        .create_subscription(request.into())
        .await?;
    Ok(Json(subscription))
}

/// GET /subscriptions/:id
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .payment_provider
        .get_subscription(&subscription_id)
        .await?;
    Ok(Json(subscription))
}

/// GET /subscriptions/customer/:id?status=
pub async fn list_customer_subscriptions(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    query: Result<Query<ListSubscriptionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    if query.status == Some(SubscriptionStatus::Unknown) {
        return Err(ApiError::BadRequest("Invalid subscription status".to_string()));
    }

    let subscriptions = state
        .payment_provider
        .list_customer_subscriptions(&customer_id, query.status)
        .await?;
    Ok(Json(ListResponse {
        data: subscriptions,
    }))
}

/// PUT /subscriptions/:id
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    body: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let subscription = state
        .payment_provider
        .update_subscription(&subscription_id, request.into())
        .await?;
    Ok(Json(subscription))
}

/// POST /subscriptions/:id/cancel
///
/// The body is optional; without one the subscription is cancelled at the
/// end of the current period. A body that is present must be valid JSON.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CancelSubscriptionRequest::default()
    } else {
        let Json(request) = Json::<CancelSubscriptionRequest>::from_bytes(&body)?;
        request
    };
    let subscription = state
        .payment_provider
        .cancel_subscription(&subscription_id, request.immediate)
        .await?;
    Ok(Json(subscription))
}

/// POST /subscriptions/:id/resume
pub async fn resume_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .payment_provider
        .resume_subscription(&subscription_id)
        .await?;
    Ok(Json(subscription))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks & Config
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks - Verify and dispatch a Stripe webhook event
///
/// The body is taken as raw bytes: the signature covers the exact payload.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingSignature)?;

    let handler = state.process_webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = handler.handle(cmd).await?;

    match result.outcome {
        DispatchOutcome::Delivered(count) => tracing::debug!(
            event_id = %result.event_id,
            event_type = %result.event_type,
            handlers = count,
            "Webhook delivered"
        ),
        DispatchOutcome::NoHandlers => {}
    }

    Ok(Json(WebhookReceivedResponse { received: true }))
}

/// GET /config - Publishable key for client-side Stripe.js
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(PublishableKeyResponse {
        publishable_key: state.stripe.publishable_key.clone(),
    })
}
