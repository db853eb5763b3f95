//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - checkout, customers, subscriptions, payment intents
//!   and webhook verification against the payment gateway
//! - `WebhookHandler` - reacts to a verified webhook event

mod payment_provider;
mod webhook_handler;

pub use payment_provider::{
    CardDetails, CheckoutLineItem, CheckoutMode, CheckoutSession, CheckoutSessionSummary,
    CreateCheckoutSessionParams, CreateCustomerParams, CreatePaymentIntentParams,
    CreateSubscriptionParams, Customer, Metadata, PaymentError, PaymentErrorCode, PaymentIntent,
    PaymentMethod, PaymentMethodKind, PaymentProvider, PriceData, Recurring, RecurringInterval,
    Subscription, SubscriptionItem, SubscriptionItemParams, SubscriptionStatus,
    UpdateCustomerParams, UpdateSubscriptionItemParams, UpdateSubscriptionParams,
};
pub use webhook_handler::{FnHandler, HandlerFuture, WebhookHandler, WebhookHandlerError};
