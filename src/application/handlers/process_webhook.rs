//! ProcessWebhookHandler - Command handler for incoming provider webhooks.

use std::sync::Arc;

use thiserror::Error;

use crate::application::webhooks::{DispatchOutcome, WebhookDispatchError, WebhookRegistry};
use crate::ports::{PaymentError, PaymentErrorCode, PaymentProvider};

/// Command to process a webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub outcome: DispatchOutcome,
}

#[derive(Debug, Error)]
pub enum WebhookProcessingError {
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Webhook secret not configured")]
    WebhookSecretMissing,

    #[error(transparent)]
    Provider(PaymentError),

    #[error(transparent)]
    Dispatch(#[from] WebhookDispatchError),
}

impl From<PaymentError> for WebhookProcessingError {
    fn from(err: PaymentError) -> Self {
        match err.code {
            PaymentErrorCode::InvalidWebhook => Self::InvalidSignature(err.message),
            PaymentErrorCode::WebhookSecretMissing => Self::WebhookSecretMissing,
            _ => Self::Provider(err),
        }
    }
}

/// Verifies a webhook delivery and routes it to registered handlers.
pub struct ProcessWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    registry: Arc<WebhookRegistry>,
}

impl ProcessWebhookHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, registry: Arc<WebhookRegistry>) -> Self {
        Self {
            payment_provider,
            registry,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookProcessingError> {
        // 1. Verify signature and parse event
        let event = self
            .payment_provider
            .construct_webhook_event(&cmd.payload, &cmd.signature)
            .await?;

        // 2. Fan out to handlers
        let outcome = self.registry.dispatch(&event).await?;

        Ok(ProcessWebhookResult {
            event_id: event.id,
            event_type: event.event_type,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::webhook::WebhookEvent;
    use crate::ports::{FnHandler, WebhookHandler, WebhookHandlerError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn command() -> ProcessWebhookCommand {
        let event = MockPaymentProvider::checkout_completed_event("cs_1", "cus_1");
        ProcessWebhookCommand {
            payload: serde_json::to_vec(&event).unwrap(),
            signature: "t=1704067200,v1=deadbeef".to_string(),
        }
    }

    fn counting_handler(counter: Arc<AtomicUsize>) -> Arc<dyn WebhookHandler> {
        Arc::new(FnHandler::new("counter", move |_event: &WebhookEvent| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }))
    }

    #[tokio::test]
    async fn verified_event_is_dispatched() {
        let registry = Arc::new(WebhookRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("checkout.session.completed", counting_handler(counter.clone()));

        let handler = ProcessWebhookHandler::new(Arc::new(MockPaymentProvider::new()), registry);
        let result = handler.handle(command()).await.unwrap();

        assert_eq!(result.event_id, "evt_cs_1");
        assert_eq!(result.event_type, "checkout.session.completed");
        assert_eq!(result.outcome, DispatchOutcome::Delivered(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bad_signature_skips_handlers() {
        let registry = Arc::new(WebhookRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("checkout.session.completed", counting_handler(counter.clone()));

        let handler =
            ProcessWebhookHandler::new(Arc::new(MockPaymentProvider::rejecting_webhooks()), registry);
        let err = handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, WebhookProcessingError::InvalidSignature(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_secret_is_reported() {
        let handler = ProcessWebhookHandler::new(
            Arc::new(MockPaymentProvider::without_webhook_secret()),
            Arc::new(WebhookRegistry::new()),
        );

        let err = handler.handle(command()).await.unwrap_err();
        assert!(matches!(err, WebhookProcessingError::WebhookSecretMissing));
    }

    #[tokio::test]
    async fn handler_failure_surfaces_as_dispatch_error() {
        let registry = Arc::new(WebhookRegistry::new());
        registry.register(
            "checkout.session.completed",
            Arc::new(FnHandler::new("fulfillment", |_event: &WebhookEvent| {
                Box::pin(async { Err(WebhookHandlerError::new("warehouse offline")) })
            })),
        );

        let handler = ProcessWebhookHandler::new(Arc::new(MockPaymentProvider::new()), registry);
        let err = handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, WebhookProcessingError::Dispatch(_)));
        assert!(err.to_string().contains("warehouse offline"));
    }

    #[tokio::test]
    async fn unhandled_event_type_is_acknowledged() {
        let handler = ProcessWebhookHandler::new(
            Arc::new(MockPaymentProvider::new()),
            Arc::new(WebhookRegistry::new()),
        );

        let result = handler.handle(command()).await.unwrap();
        assert_eq!(result.outcome, DispatchOutcome::NoHandlers);
    }
}
