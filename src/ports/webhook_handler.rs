//! WebhookHandler port - Interface for reacting to verified webhook events.
//!
//! Handlers register interest in event types on the webhook registry
//! without knowing how events arrive or how they were verified.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::webhook::WebhookEvent;

/// Error raised by a webhook handler.
///
/// Carries only a message; the registry attaches the handler name when
/// it reports the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WebhookHandlerError {
    pub message: String,
}

impl WebhookHandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for WebhookHandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("failed to decode event object: {}", err))
    }
}

/// Handler for processing webhook events.
///
/// Implementations should be:
/// - **Idempotent** - providers retry deliveries
/// - **Quick** - the provider waits on the HTTP response
///
/// # Example
///
/// ```ignore
/// struct FulfillOrder { /* ... */ }
///
/// #[async_trait]
/// impl WebhookHandler for FulfillOrder {
///     async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookHandlerError> {
///         let session: SessionView = event.object_as()?;
///         // Mark order paid...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "FulfillOrder"
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookHandlerError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Boxed future returned by closure handlers.
pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), WebhookHandlerError>> + Send + 'a>>;

/// Adapts a closure into a [`WebhookHandler`].
///
/// ```ignore
/// let handler = FnHandler::new("audit", |event| Box::pin(async move {
///     tracing::info!(event_id = %event.id, "audited");
///     Ok(())
/// }));
/// ```
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a WebhookEvent) -> HandlerFuture<'a> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

#[async_trait]
impl<F> WebhookHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a WebhookEvent) -> HandlerFuture<'a> + Send + Sync,
{
    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookHandlerError> {
        (self.f)(event).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
