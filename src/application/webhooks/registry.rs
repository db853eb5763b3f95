//! Webhook handler registry.
//!
//! Maps event type names to the handlers interested in them and fans a
//! verified event out to every matching handler.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use thiserror::Error;

use crate::domain::webhook::{WebhookEvent, WebhookEventType};
use crate::ports::WebhookHandler;

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No handler is registered for the event type.
    NoHandlers,
    /// Every registered handler completed successfully.
    Delivered(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookDispatchError {
    /// At least one handler failed. Reports the first failure in
    /// registration order; every handler still ran to completion.
    #[error("webhook handler {handler} failed for {event_type}: {message} ({failures} of {total} handlers failed)")]
    HandlerFailed {
        event_type: String,
        handler: &'static str,
        message: String,
        failures: usize,
        total: usize,
    },
}

type HandlerMap = HashMap<String, Vec<Arc<dyn WebhookHandler>>>;

/// Registry of webhook handlers keyed by event type.
///
/// Lives for the lifetime of the server and is shared through the app
/// state. Registration order is preserved per event type and the same
/// handler may be registered more than once.
///
/// # Example
///
/// ```ignore
/// let registry = WebhookRegistry::new();
/// registry.register(WebhookEventType::CheckoutSessionCompleted, Arc::new(FulfillOrder::new()));
///
/// let outcome = registry.dispatch(&event).await?;
/// ```
#[derive(Default)]
pub struct WebhookRegistry {
    handlers: RwLock<HandlerMap>,
}

impl WebhookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for an event type.
    pub fn register(
        &self,
        event_type: impl Into<WebhookEventType>,
        handler: Arc<dyn WebhookHandler>,
    ) {
        let event_type = event_type.into();
        tracing::debug!(event_type = %event_type, handler = handler.name(), "Registering webhook handler");

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers
            .entry(event_type.as_str().to_string())
            .or_default()
            .push(handler);
    }

    /// Removes the first registration of this handler instance.
    ///
    /// Handlers are compared by identity, not by name. Returns `false` when
    /// the handler was not registered for the event type.
    pub fn unregister(
        &self,
        event_type: impl Into<WebhookEventType>,
        handler: &Arc<dyn WebhookHandler>,
    ) -> bool {
        let event_type = event_type.into();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);

        let Some(list) = handlers.get_mut(event_type.as_str()) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| same_handler(h, handler)) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            handlers.remove(event_type.as_str());
        }
        tracing::debug!(event_type = %event_type, handler = handler.name(), "Unregistered webhook handler");
        true
    }

    /// Snapshot of the handlers registered for an event type.
    pub fn handlers_for(&self, event_type: &str) -> Vec<Arc<dyn WebhookHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Event types with at least one handler, sorted.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Delivers an event to every handler registered for its type.
    ///
    /// Handlers run concurrently and all of them run to completion, even
    /// when one fails.
    pub async fn dispatch(
        &self,
        event: &WebhookEvent,
    ) -> Result<DispatchOutcome, WebhookDispatchError> {
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Processing webhook event");

        // Clone handlers to release lock before await points
        let handlers = self.handlers_for(&event.event_type);

        if handlers.is_empty() {
            tracing::warn!(event_type = %event.event_type, "No handlers registered for webhook event type");
            return Ok(DispatchOutcome::NoHandlers);
        }

        let results = join_all(handlers.iter().map(|h| h.handle(event))).await;

        let mut first_failure = None;
        let mut failures = 0;
        for (handler, result) in handlers.iter().zip(results) {
            match result {
                Ok(()) => {
                    tracing::debug!(event_id = %event.id, handler = handler.name(), "Webhook handler succeeded");
                }
                Err(e) => {
                    tracing::error!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        handler = handler.name(),
                        error = %e,
                        "Webhook handler failed"
                    );
                    failures += 1;
                    first_failure.get_or_insert((handler.name(), e.message));
                }
            }
        }

        match first_failure {
            Some((handler, message)) => Err(WebhookDispatchError::HandlerFailed {
                event_type: event.event_type.clone(),
                handler,
                message,
                failures,
                total: handlers.len(),
            }),
            None => {
                tracing::info!(event_id = %event.id, handlers = handlers.len(), "Webhook event processed");
                Ok(DispatchOutcome::Delivered(handlers.len()))
            }
        }
    }
}

impl std::fmt::Debug for WebhookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookRegistry")
            .field("event_types", &self.event_types())
            .finish()
    }
}

/// Identity comparison on the data pointer; vtable pointers for the same
/// type may differ across codegen units.
fn same_handler(a: &Arc<dyn WebhookHandler>, b: &Arc<dyn WebhookHandler>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const u8,
        Arc::as_ptr(b) as *const u8,
    )
}
