//! Webhook event types the gateway knows how to route.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Provider event type.
///
/// Unrecognized types are preserved in `Other` so handlers can still be
/// registered for them by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WebhookEventType {
    CheckoutSessionCompleted,
    CheckoutSessionExpired,
    PaymentIntentSucceeded,
    PaymentIntentPaymentFailed,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    SubscriptionTrialWillEnd,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    PaymentMethodAttached,
    PaymentMethodDetached,
    Other(String),
}

impl WebhookEventType {
    /// Every known event type, in a stable order.
    pub const ALL: [WebhookEventType; 12] = [
        Self::CheckoutSessionCompleted,
        Self::CheckoutSessionExpired,
        Self::PaymentIntentSucceeded,
        Self::PaymentIntentPaymentFailed,
        Self::SubscriptionCreated,
        Self::SubscriptionUpdated,
        Self::SubscriptionDeleted,
        Self::SubscriptionTrialWillEnd,
        Self::InvoicePaymentSucceeded,
        Self::InvoicePaymentFailed,
        Self::PaymentMethodAttached,
        Self::PaymentMethodDetached,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CheckoutSessionExpired => "checkout.session.expired",
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentPaymentFailed => "payment_intent.payment_failed",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::SubscriptionTrialWillEnd => "customer.subscription.trial_will_end",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::PaymentMethodAttached => "payment_method.attached",
            Self::PaymentMethodDetached => "payment_method.detached",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Self::Other(s.to_string()))
    }
}

impl From<String> for WebhookEventType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<WebhookEventType> for String {
    fn from(t: WebhookEventType) -> Self {
        t.as_str().to_string()
    }
}

impl FromStr for WebhookEventType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
