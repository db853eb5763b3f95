//! Application handlers.
//!
//! Command handlers that orchestrate the payment provider and the
//! webhook registry.

mod create_payment_intent;
mod process_webhook;

pub use create_payment_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    PaymentIntentError,
};
pub use process_webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult, WebhookProcessingError,
};
