//! HTTP handlers for the storefront checkout endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::AppState;
use crate::application::CreatePaymentIntentCommand;

use super::dto::{CreatePaymentIntentRequest, HealthResponse, PaymentIntentResponse};

/// POST /api/create-payment-intent - Open a payment intent for the cart
pub async fn create_payment_intent(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.stripe_configured() {
        return Err(ApiError::StripeDisabled);
    }

    let Json(request) = body?;
    let handler = state.create_payment_intent_handler();
    let cmd = CreatePaymentIntentCommand {
        items: request.items,
        receipt_email: request.billing_details.and_then(|b| b.email),
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(PaymentIntentResponse {
        client_secret: result.client_secret,
        amount: result.amount,
    }))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        stripe_configured: state.stripe_configured(),
    })
}
