//! Stripe webhook signature verification.
//!
//! # Security
//!
//! - HMAC-SHA256 over `"{timestamp}.{payload}"` keyed with the signing secret
//! - Constant-time comparison against every `v1` signature in the header
//! - Timestamp window to limit replay (5 minutes old, 60 seconds ahead)

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::webhook::WebhookEvent;
use crate::ports::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
pub const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
pub const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureParseError {
    #[error("Missing Stripe-Signature header")]
    MissingHeader,

    #[error("Missing timestamp (t=) in signature")]
    MissingTimestamp,

    #[error("Missing v1 signature in header")]
    MissingV1Signature,

    #[error("Invalid timestamp format")]
    InvalidTimestamp,

    #[error("Invalid signature format (not valid hex)")]
    InvalidSignatureFormat,
}

/// Parsed Stripe-Signature header components.
///
/// The header format is `t=timestamp,v1=signature[,v1=signature][,v0=legacy]`.
/// Stripe sends several `v1` entries while a signing secret is being rolled.
///
/// ```ignore
/// let parsed = SignatureHeader::parse("t=1704067200,v1=abc123...")?;
/// assert_eq!(parsed.timestamp, 1704067200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe generated the event.
    pub timestamp: i64,

    /// v1 signatures (HMAC-SHA256), decoded from hex.
    pub v1_signatures: Vec<Vec<u8>>,

    /// Legacy v0 signature (never verified).
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.trim().is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();
        let mut v0_signature = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value).map_err(|_| SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                "v0" => {
                    v0_signature = hex::decode(value).ok();
                }
                // Unknown schemes are ignored for forward compatibility
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
            v0_signature,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Verification
// ════════════════════════════════════════════════════════════════════════════════

/// Verifies webhook deliveries and parses them into events.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    require_livemode: bool,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString, require_livemode: bool) -> Self {
        Self {
            secret,
            require_livemode,
        }
    }

    /// Verify `payload` against the `Stripe-Signature` header at time `now`.
    pub fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<WebhookEvent, PaymentError> {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            tracing::error!("Webhook received but no webhook secret is configured");
            return Err(PaymentError::not_configured("Webhook secret"));
        }

        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        // 2. Validate timestamp (prevent replay attacks); `t` is caller-controlled
        let age = now.saturating_sub(header.timestamp);
        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }
        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        // 3. Compare against every v1 signature in constant time
        let expected = compute_signature(secret, header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));
        if !matched {
            tracing::warn!(
                signatures = header.v1_signatures.len(),
                "No webhook signature matched the expected signature"
            );
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        // 4. Parse event
        let event: WebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        if self.require_livemode && !event.livemode {
            tracing::warn!(event_id = %event.id, "Rejected test mode event");
            return Err(PaymentError::invalid_webhook(
                "Test mode events not allowed",
            ));
        }

        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Webhook signature verified");
        Ok(event)
    }
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::invalid_webhook(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a `Stripe-Signature` header value for `payload`.
///
/// Used to sign test deliveries and local replays.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, PaymentError> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_704_067_200;

    fn payload(livemode: bool) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_sig",
            "type": "payment_intent.succeeded",
            "created": NOW,
            "livemode": livemode,
            "data": {"object": {"id": "pi_1", "amount": 19099}}
        }))
        .unwrap()
    }

    fn verifier(require_livemode: bool) -> WebhookVerifier {
        WebhookVerifier::new(SecretString::new(SECRET.to_string()), require_livemode)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Header Parsing
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_signature_header_valid() {
        let header = SignatureHeader::parse("t=1704067200,v1=abcdef0123456789").unwrap();
        assert_eq!(header.timestamp, 1704067200);
        assert_eq!(header.v1_signatures, vec![vec![0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89]]);
        assert!(header.v0_signature.is_none());
    }

    #[test]
    fn parse_signature_header_with_multiple_v1_and_v0() {
        let header = SignatureHeader::parse("t=1,v1=aa,v1=bb,v0=cc").unwrap();
        assert_eq!(header.v1_signatures, vec![vec![0xaa], vec![0xbb]]);
        assert_eq!(header.v0_signature, Some(vec![0xcc]));
    }

    #[test]
    fn parse_signature_header_errors() {
        assert_eq!(SignatureHeader::parse(""), Err(SignatureParseError::MissingHeader));
        assert_eq!(SignatureHeader::parse("v1=abcd"), Err(SignatureParseError::MissingTimestamp));
        assert_eq!(SignatureHeader::parse("t=1704067200"), Err(SignatureParseError::MissingV1Signature));
        assert_eq!(SignatureHeader::parse("t=abc,v1=abcd"), Err(SignatureParseError::InvalidTimestamp));
        assert_eq!(SignatureHeader::parse("t=1,v1=xyz"), Err(SignatureParseError::InvalidSignatureFormat));
        assert_eq!(SignatureHeader::parse("t=1,v1=abc"), Err(SignatureParseError::InvalidSignatureFormat));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verification
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn valid_signature_yields_event() {
        let body = payload(false);
        let header = sign_payload(SECRET, NOW, &body).unwrap();

        let event = verifier(false).verify(&body, &header, NOW + 10).unwrap();
        assert_eq!(event.id, "evt_sig");
        assert_eq!(event.object_id(), Some("pi_1"));
    }

    #[test]
    fn any_matching_v1_signature_is_accepted() {
        let body = payload(false);
        let good = sign_payload(SECRET, NOW, &body).unwrap();
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "00".repeat(32), good_sig);

        assert!(verifier(false).verify(&body, &header, NOW).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = payload(false);
        let header = sign_payload("whsec_other", NOW, &body).unwrap();

        let err = verifier(false).verify(&body, &header, NOW).unwrap_err();
        assert_eq!(err.message, "Invalid signature");
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let body = payload(false);
        let header = sign_payload(SECRET, NOW, &body).unwrap();
        let mut tampered = body.clone();
        tampered.extend_from_slice(b" ");

        assert!(verifier(false).verify(&tampered, &header, NOW).is_err());
    }

    #[test]
    fn stale_and_future_timestamps_are_rejected() {
        let body = payload(false);
        let header = sign_payload(SECRET, NOW, &body).unwrap();

        assert!(verifier(false).verify(&body, &header, NOW + MAX_TIMESTAMP_AGE_SECS).is_ok());
        assert!(verifier(false).verify(&body, &header, NOW + MAX_TIMESTAMP_AGE_SECS + 1).is_err());
        assert!(verifier(false).verify(&body, &header, NOW - MAX_FUTURE_TOLERANCE_SECS).is_ok());
        assert!(verifier(false).verify(&body, &header, NOW - MAX_FUTURE_TOLERANCE_SECS - 1).is_err());
    }

    #[test]
    fn extreme_timestamps_are_rejected_without_overflow() {
        let oldest = format!("t={},v1=00", i64::MIN);
        let err = verifier(false).verify(b"{}", &oldest, NOW).unwrap_err();
        assert!(err.is_webhook_rejection());
        assert!(err.message.contains("too old"));

        let newest = format!("t={},v1=00", i64::MAX);
        let err = verifier(false).verify(b"{}", &newest, -NOW).unwrap_err();
        assert!(err.is_webhook_rejection());
        assert!(err.message.contains("future"));
    }

    #[test]
    fn livemode_enforced_when_required() {
        let test_body = payload(false);
        let header = sign_payload(SECRET, NOW, &test_body).unwrap();
        assert!(verifier(true).verify(&test_body, &header, NOW).is_err());

        let live_body = payload(true);
        let header = sign_payload(SECRET, NOW, &live_body).unwrap();
        assert!(verifier(true).verify(&live_body, &header, NOW).is_ok());
    }

    #[test]
    fn missing_secret_is_reported_before_parsing() {
        let verifier = WebhookVerifier::new(SecretString::new(String::new()), false);

        let err = verifier.verify(b"{}", "garbage", NOW).unwrap_err();
        assert_eq!(err.code, crate::ports::PaymentErrorCode::WebhookSecretMissing);
    }

    #[test]
    fn signed_garbage_is_rejected_as_invalid_payload() {
        let body = b"not json".to_vec();
        let header = sign_payload(SECRET, NOW, &body).unwrap();

        let err = verifier(false).verify(&body, &header, NOW).unwrap_err();
        assert!(err.message.starts_with("Invalid JSON"));
    }
}
