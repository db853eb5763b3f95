//! Verified webhook event.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::WebhookEventType;

/// A provider event whose signature has been verified.
///
/// The affected object is kept as raw JSON; handlers decode the parts they
/// need with [`WebhookEvent::object_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type name, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,

    pub data: WebhookEventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    #[serde(default)]
    pub previous_attributes: Option<serde_json::Value>,
}

impl WebhookEvent {
    pub fn event_type(&self) -> WebhookEventType {
        WebhookEventType::from(self.event_type.as_str())
    }

    /// Decodes the event object into a typed view.
    pub fn object_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }

    /// Id of the affected object, when present.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }
}
