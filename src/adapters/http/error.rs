//! API error type shared by the gateway and storefront routers.
//!
//! Every error is logged before it is turned into a response. The request
//! span opened by `TraceLayer` carries the method and path.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::application::{PaymentIntentError, WebhookProcessingError};
use crate::ports::PaymentError;

/// JSON error body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Missing stripe-signature header")]
    MissingSignature,

    #[error(transparent)]
    Webhook(#[from] WebhookProcessingError),

    #[error(transparent)]
    PaymentIntent(#[from] PaymentIntentError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Stripe is not configured")]
    StripeDisabled,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status code, error code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Payment(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PAYMENT_PROVIDER_ERROR",
                err.message.clone(),
            ),
            ApiError::MissingSignature => (
                StatusCode::BAD_REQUEST,
                "MISSING_SIGNATURE",
                self.to_string(),
            ),
            ApiError::Webhook(err) => match err {
                WebhookProcessingError::InvalidSignature(_) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_WEBHOOK_SIGNATURE",
                    "Invalid webhook signature".to_string(),
                ),
                WebhookProcessingError::WebhookSecretMissing => (
                    StatusCode::BAD_REQUEST,
                    "WEBHOOK_SECRET_MISSING",
                    "Webhook secret not configured".to_string(),
                ),
                WebhookProcessingError::Provider(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PAYMENT_PROVIDER_ERROR",
                    inner.message.clone(),
                ),
                WebhookProcessingError::Dispatch(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "WEBHOOK_HANDLER_FAILED",
                    inner.to_string(),
                ),
            },
            ApiError::PaymentIntent(err) => match err {
                PaymentIntentError::EmptyCart => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_CART",
                    "Invalid items in cart".to_string(),
                ),
                PaymentIntentError::InvalidCart(inner) => {
                    (StatusCode::BAD_REQUEST, "INVALID_CART", inner.to_string())
                }
                PaymentIntentError::MissingClientSecret(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PAYMENT_PROVIDER_ERROR",
                    err.to_string(),
                ),
                PaymentIntentError::Provider(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PAYMENT_PROVIDER_ERROR",
                    inner.message.clone(),
                ),
            },
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", message.clone())
            }
            ApiError::StripeDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STRIPE_DISABLED",
                self.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), code, error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::WebhookDispatchError;
    use crate::domain::cart::{CartError, ProductId};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn provider_errors_are_internal_with_message() {
        let (status, code, message) =
            ApiError::from(PaymentError::card_declined("Your card was declined.")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "PAYMENT_PROVIDER_ERROR");
        assert_eq!(message, "Your card was declined.");
    }

    #[test]
    fn deleted_customer_is_still_internal() {
        assert_eq!(
            status_of(PaymentError::not_found("Customer").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn webhook_errors_map_to_bad_request_or_internal() {
        assert_eq!(status_of(ApiError::MissingSignature), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(WebhookProcessingError::InvalidSignature("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(WebhookProcessingError::WebhookSecretMissing.into()),
            StatusCode::BAD_REQUEST
        );

        let dispatch = WebhookDispatchError::HandlerFailed {
            event_type: "invoice.paid".to_string(),
            handler: "ledger",
            message: "db down".to_string(),
            failures: 1,
            total: 2,
        };
        assert_eq!(
            status_of(WebhookProcessingError::Dispatch(dispatch).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_signature_message_is_generic() {
        let (_, _, message) =
            ApiError::from(WebhookProcessingError::InvalidSignature("v1 mismatch".into())).parts();
        assert_eq!(message, "Invalid webhook signature");
    }

    #[test]
    fn cart_errors_are_bad_requests() {
        assert_eq!(status_of(PaymentIntentError::EmptyCart.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(
                PaymentIntentError::InvalidCart(CartError::NegativePrice(ProductId::new(3))).into()
            ),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn disabled_stripe_is_unavailable() {
        assert_eq!(status_of(ApiError::StripeDisabled), StatusCode::SERVICE_UNAVAILABLE);
    }
}
