//! Webhook event routing.
//!
//! - `WebhookRegistry` - event type to handler mapping with concurrent fan-out
//! - `register_default_handlers` - logging handlers for every known event type

mod default_handlers;
mod registry;

pub use default_handlers::{register_default_handlers, EventLogger};
pub use registry::{DispatchOutcome, WebhookDispatchError, WebhookRegistry};
