//! Shared application state for the HTTP routers.

use std::sync::Arc;

use crate::application::{CreatePaymentIntentHandler, ProcessWebhookHandler, WebhookRegistry};
use crate::config::{ShopConfig, StripeSettings};
use crate::ports::PaymentProvider;

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_registry: Arc<WebhookRegistry>,
    pub stripe: Arc<StripeSettings>,
    pub shop: Arc<ShopConfig>,
}

impl AppState {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        webhook_registry: Arc<WebhookRegistry>,
        stripe: StripeSettings,
        shop: ShopConfig,
    ) -> Self {
        Self {
            payment_provider,
            webhook_registry,
            stripe: Arc::new(stripe),
            shop: Arc::new(shop),
        }
    }

    /// Create handlers on demand from the shared state.
    pub fn process_webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(self.payment_provider.clone(), self.webhook_registry.clone())
    }

    pub fn create_payment_intent_handler(&self) -> CreatePaymentIntentHandler {
        CreatePaymentIntentHandler::new(self.payment_provider.clone(), self.shop.as_ref().clone())
    }

    /// True when Stripe is enabled and a secret key is present.
    pub fn stripe_configured(&self) -> bool {
        self.stripe.enabled && !self.stripe.secret_key.is_empty()
    }
}
