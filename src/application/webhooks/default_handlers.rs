//! Built-in handlers that log the salient fields of each known event.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::WebhookRegistry;
use crate::domain::webhook::{WebhookEvent, WebhookEventType};
use crate::ports::{WebhookHandler, WebhookHandlerError};

/// Registers one [`EventLogger`] per known event type.
pub fn register_default_handlers(registry: &WebhookRegistry) {
    let logger: Arc<dyn WebhookHandler> = Arc::new(EventLogger);
    for event_type in WebhookEventType::ALL {
        registry.register(event_type, Arc::clone(&logger));
    }
}

/// Logs checkout, payment, subscription, invoice and payment method events.
///
/// Failures (`payment_intent.payment_failed`, `invoice.payment_failed`) are
/// logged at error level, everything else at info.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLogger;

#[async_trait]
impl WebhookHandler for EventLogger {
    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookHandlerError> {
        match event.event_type() {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: SessionView = event.object_as()?;
                tracing::info!(
                    session_id = %session.id,
                    customer_id = ?session.customer,
                    mode = ?session.mode,
                    payment_status = ?session.payment_status,
                    "Checkout session completed"
                );
            }
            WebhookEventType::CheckoutSessionExpired => {
                let session: SessionView = event.object_as()?;
                tracing::info!(session_id = %session.id, "Checkout session expired");
            }
            WebhookEventType::PaymentIntentSucceeded => {
                let intent: PaymentIntentView = event.object_as()?;
                tracing::info!(
                    payment_intent_id = %intent.id,
                    amount = ?intent.amount,
                    currency = ?intent.currency,
                    "Payment succeeded"
                );
            }
            WebhookEventType::PaymentIntentPaymentFailed => {
                let intent: PaymentIntentView = event.object_as()?;
                let last_error = intent.last_payment_error.and_then(|e| e.message);
                tracing::error!(
                    payment_intent_id = %intent.id,
                    last_error = ?last_error,
                    "Payment failed"
                );
            }
            WebhookEventType::SubscriptionCreated => {
                let sub: SubscriptionView = event.object_as()?;
                tracing::info!(
                    subscription_id = %sub.id,
                    customer_id = ?sub.customer,
                    status = ?sub.status,
                    "Subscription created"
                );
            }
            WebhookEventType::SubscriptionUpdated => {
                let sub: SubscriptionView = event.object_as()?;
                tracing::info!(
                    subscription_id = %sub.id,
                    customer_id = ?sub.customer,
                    status = ?sub.status,
                    "Subscription updated"
                );
            }
            WebhookEventType::SubscriptionDeleted => {
                let sub: SubscriptionView = event.object_as()?;
                tracing::info!(
                    subscription_id = %sub.id,
                    customer_id = ?sub.customer,
                    "Subscription deleted"
                );
            }
            WebhookEventType::SubscriptionTrialWillEnd => {
                let sub: SubscriptionView = event.object_as()?;
                tracing::info!(
                    subscription_id = %sub.id,
                    customer_id = ?sub.customer,
                    trial_end = ?sub.trial_end,
                    "Subscription trial ending soon"
                );
            }
            WebhookEventType::InvoicePaymentSucceeded => {
                let invoice: InvoiceView = event.object_as()?;
                tracing::info!(
                    invoice_id = %invoice.id,
                    customer_id = ?invoice.customer,
                    subscription_id = ?invoice.subscription,
                    amount_paid = ?invoice.amount_paid,
                    "Invoice payment succeeded"
                );
            }
            WebhookEventType::InvoicePaymentFailed => {
                let invoice: InvoiceView = event.object_as()?;
                tracing::error!(
                    invoice_id = %invoice.id,
                    customer_id = ?invoice.customer,
                    subscription_id = ?invoice.subscription,
                    attempt_count = ?invoice.attempt_count,
                    "Invoice payment failed"
                );
            }
            WebhookEventType::PaymentMethodAttached => {
                let method: PaymentMethodView = event.object_as()?;
                tracing::info!(
                    payment_method_id = %method.id,
                    customer_id = ?method.customer,
                    kind = ?method.kind,
                    "Payment method attached"
                );
            }
            WebhookEventType::PaymentMethodDetached => {
                let method: PaymentMethodView = event.object_as()?;
                tracing::info!(
                    payment_method_id = %method.id,
                    kind = ?method.kind,
                    "Payment method detached"
                );
            }
            WebhookEventType::Other(event_type) => {
                tracing::debug!(event_id = %event.id, event_type = %event_type, "Unhandled webhook event");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "EventLogger"
    }
}

// Partial views of provider objects. Only `id` is required; everything else
// is logged when present.

#[derive(Debug, Deserialize)]
struct SessionView {
    id: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentView {
    id: String,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    last_payment_error: Option<LastPaymentError>,
}

#[derive(Debug, Deserialize)]
struct LastPaymentError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionView {
    id: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    trial_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct InvoiceView {
    id: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    amount_paid: Option<i64>,
    #[serde(default)]
    attempt_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodView {
    id: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}
