//! Webhook events pushed by the payment provider.

mod event;
mod event_type;

pub use event::{WebhookEvent, WebhookEventData};
pub use event_type::WebhookEventType;
