//! Thin Stripe REST client.
//!
//! Owns authentication, API versioning, idempotency keys and the mapping of
//! Stripe error bodies onto `PaymentError`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::ports::{PaymentError, PaymentErrorCode};

use super::form::FormParams;
use super::types::StripeErrorBody;
use super::StripeConfig;

/// Characters escaped in a path segment. Stripe ids are `[A-Za-z0-9_]`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'-');

/// Builds `/v1/{resource}/{id}[/{action}]` with each segment percent-encoded.
///
/// Ids arrive from request paths and bodies; an id must stay one segment, so
/// `/`, `?` and `#` are escaped and dot-only ids (which URL parsers resolve as
/// `.`/`..` even when encoded) are rejected.
pub(super) fn resource_path(segments: &[&str]) -> Result<String, PaymentError> {
    let mut path = String::from("/v1");
    for segment in segments {
        if segment.is_empty() || segment.chars().all(|c| c == '.') {
            return Err(PaymentError::invalid_request(format!(
                "Invalid resource id: '{}'",
                segment
            )));
        }
        path.push('/');
        path.extend(utf8_percent_encode(segment, PATH_SEGMENT));
    }
    Ok(path)
}

pub struct StripeClient {
    config: StripeConfig,
    http: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &FormParams,
    ) -> Result<T, PaymentError> {
        let request = self.request(Method::GET, path).query(query.pairs());
        self.send(Method::GET, path, request).await
    }

    /// POST with a fresh idempotency key so retries of this call are safe.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &FormParams,
    ) -> Result<T, PaymentError> {
        let request = self
            .request(Method::POST, path)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(form.pairs());
        self.send(Method::POST, path, request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let request = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.api_base_url, path);
        self.http
            .request(method, url)
            .bearer_auth(self.config.api_key.expose_secret())
            .header("Stripe-Version", &self.config.api_version)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, PaymentError> {
        tracing::debug!(%method, path, "Stripe request");

        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, path, error = %e, "Stripe request failed");
            PaymentError::network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error = error_from_response(response).await;
            tracing::error!(
                %method,
                path,
                status = status.as_u16(),
                code = %error.code,
                provider_code = ?error.provider_code,
                error = %error.message,
                "Stripe API error"
            );
            return Err(error);
        }

        response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

async fn error_from_response(response: Response) -> PaymentError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    map_error(status, &body)
}

/// Maps a non-2xx Stripe response onto a `PaymentError`.
pub(super) fn map_error(status: StatusCode, body: &str) -> PaymentError {
    let api_error = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .map(|b| b.error);

    let message = api_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({}): {}", status.as_u16(), body));
    let kind = api_error.as_ref().and_then(|e| e.kind.as_deref());

    let code = match (status, kind) {
        (StatusCode::UNAUTHORIZED, _) => PaymentErrorCode::AuthenticationError,
        (StatusCode::NOT_FOUND, _) => PaymentErrorCode::NotFound,
        (StatusCode::TOO_MANY_REQUESTS, _) => PaymentErrorCode::RateLimitExceeded,
        (_, Some("card_error")) => PaymentErrorCode::CardDeclined,
        (StatusCode::BAD_REQUEST, _) | (StatusCode::PAYMENT_REQUIRED, _) => {
            PaymentErrorCode::InvalidRequest
        }
        (s, _) if s.is_server_error() => PaymentErrorCode::ProviderError,
        _ => PaymentErrorCode::Unknown,
    };

    let error = PaymentError::new(code, message);
    match api_error.and_then(|e| e.decline_code.or(e.code)) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes() {
        assert_eq!(map_error(StatusCode::UNAUTHORIZED, "").code, PaymentErrorCode::AuthenticationError);
        assert_eq!(map_error(StatusCode::NOT_FOUND, "").code, PaymentErrorCode::NotFound);
        assert_eq!(map_error(StatusCode::TOO_MANY_REQUESTS, "").code, PaymentErrorCode::RateLimitExceeded);
        assert_eq!(map_error(StatusCode::BAD_GATEWAY, "").code, PaymentErrorCode::ProviderError);
        assert_eq!(map_error(StatusCode::CONFLICT, "").code, PaymentErrorCode::Unknown);
    }

    #[test]
    fn card_errors_are_declines() {
        let body = r#"{"error":{"type":"card_error","code":"card_declined","decline_code":"insufficient_funds","message":"Your card has insufficient funds."}}"#;

        let error = map_error(StatusCode::PAYMENT_REQUIRED, body);
        assert_eq!(error.code, PaymentErrorCode::CardDeclined);
        assert_eq!(error.message, "Your card has insufficient funds.");
        assert_eq!(error.provider_code.as_deref(), Some("insufficient_funds"));
        assert!(!error.retryable);
    }

    #[test]
    fn invalid_request_keeps_stripe_message() {
        let body = r#"{"error":{"type":"invalid_request_error","code":"resource_missing","param":"customer","message":"No such customer: 'cus_x'"}}"#;

        let error = map_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(error.code, PaymentErrorCode::InvalidRequest);
        assert_eq!(error.message, "No such customer: 'cus_x'");
        assert_eq!(error.provider_code.as_deref(), Some("resource_missing"));
    }

    #[test]
    fn unparseable_body_is_included_in_message() {
        let error = map_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        assert!(error.message.contains("500"));
        assert!(error.message.contains("upstream exploded"));
    }

    #[test]
    fn rate_limits_are_retryable() {
        assert!(map_error(StatusCode::TOO_MANY_REQUESTS, "").retryable);
    }

    #[test]
    fn resource_path_joins_plain_ids() {
        assert_eq!(
            resource_path(&["payment_methods", "pm_1Abc", "attach"]).unwrap(),
            "/v1/payment_methods/pm_1Abc/attach"
        );
    }

    #[test]
    fn resource_path_keeps_ids_in_one_segment() {
        let path = resource_path(&["customers", "../refunds?charge=ch_1#x"]).unwrap();

        assert_eq!(path, "/v1/customers/%2E%2E%2Frefunds%3Fcharge%3Dch_1%23x");
        assert_eq!(path.matches('/').count(), 3);
        assert!(!path.contains('?'));
    }

    #[test]
    fn resource_path_rejects_dot_and_empty_ids() {
        for id in ["", ".", "..", "..."] {
            let err = resource_path(&["subscriptions", id]).unwrap_err();
            assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
        }
    }
}
