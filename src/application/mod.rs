//! Application layer - Commands, Handlers, and webhook routing.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
pub mod webhooks;

pub use handlers::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    PaymentIntentError, ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    WebhookProcessingError,
};
pub use webhooks::{
    register_default_handlers, DispatchOutcome, EventLogger, WebhookDispatchError,
    WebhookRegistry,
};
