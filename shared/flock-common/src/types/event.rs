//! Event Types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Well-known event names sent by the Flock platform.
pub mod names {
    /// The app was installed by a user.
    pub const APP_INSTALL: &str = "app.install";
    /// The app was uninstalled by a user.
    pub const APP_UNINSTALL: &str = "app.uninstall";
    /// A message was sent to the app's bot.
    pub const CHAT_RECEIVE_MESSAGE: &str = "chat.receiveMessage";
    /// A URL preview was requested for a link owned by the app.
    pub const CHAT_GENERATE_URL_PREVIEW: &str = "chat.generateUrlPreview";
    /// A slash command owned by the app was invoked.
    pub const CLIENT_SLASH_COMMAND: &str = "client.slashCommand";
    /// A message action owned by the app was invoked.
    pub const CLIENT_MESSAGE_ACTION: &str = "client.messageAction";
    /// A button in an attachment was pressed.
    pub const CLIENT_PRESS_BUTTON: &str = "client.pressButton";
    /// An attachment widget was opened.
    pub const CLIENT_OPEN_ATTACHMENT_WIDGET: &str = "client.openAttachmentWidget";
    /// An action was triggered inside FlockML content.
    pub const CLIENT_FLOCKML_ACTION: &str = "client.flockmlAction";
    /// An action was triggered inside a widget.
    pub const CLIENT_WIDGET_ACTION: &str = "client.widgetAction";
}

/// An event delivered by the platform to the app's event listener URL.
///
/// Only `name` and `userId` are interpreted; every other top-level field is
/// kept as-is in `payload` and serialized back flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Event name, e.g. `"client.slashCommand"`.
    pub name: String,
    /// The user the event was generated for, when there is one. A `userId`
    /// that is not a string is read as no user.
    #[serde(
        rename = "userId",
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    /// Remaining event fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl InboundEvent {
    /// Create an event with an empty payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: None,
            payload: Map::new(),
        }
    }

    /// Set the user the event belongs to.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Add a payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Parse an event from JSON text (e.g. the `flockEvent` query parameter
    /// appended to widget and browser URLs).
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(user_id)) => Some(user_id),
        _ => None,
    })
}

/// Error body used by both the platform API and the event listener:
/// `{"error": ..., "description": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error name.
    pub error: String,
    /// Human-readable description.
    pub description: String,
    /// Any additional fields.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ErrorBody {
    /// Build an error body. Attributes named `error` or `description` are
    /// dropped so they cannot shadow the primary fields.
    pub fn new(
        error: impl Into<String>,
        description: impl Into<String>,
        mut attributes: Map<String, Value>,
    ) -> Self {
        attributes.remove("error");
        attributes.remove("description");
        Self {
            error: error.into(),
            description: description.into(),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_name_user_and_payload() {
        let event: InboundEvent = serde_json::from_value(json!({
            "name": "client.slashCommand",
            "userId": "u:abc",
            "command": "todo",
            "text": "buy milk"
        }))
        .unwrap();

        assert_eq!(event.name, names::CLIENT_SLASH_COMMAND);
        assert_eq!(event.user_id.as_deref(), Some("u:abc"));
        assert_eq!(event.get("text"), Some(&json!("buy milk")));
        assert!(!event.payload.contains_key("userId"));
    }

    #[test]
    fn user_is_optional_and_serializes_flat() {
        let event = InboundEvent::new("app.install").with_field("token", json!("t"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"name": "app.install", "token": "t"}));
    }

    #[test]
    fn non_string_user_is_no_user() {
        let event: InboundEvent =
            serde_json::from_value(json!({"name": "app.install", "userId": 42})).unwrap();
        assert_eq!(event.user_id, None);
        assert!(!event.payload.contains_key("userId"));

        let event: InboundEvent =
            serde_json::from_value(json!({"name": "app.install", "userId": null})).unwrap();
        assert_eq!(event.user_id, None);
    }

    #[test]
    fn from_json_str_rejects_garbage() {
        assert!(InboundEvent::from_json_str("{not json").is_err());
        assert!(InboundEvent::from_json_str(r#"{"userId":"u:1"}"#).is_err());
    }

    #[test]
    fn error_body_attributes_cannot_shadow_fields() {
        let mut attrs = Map::new();
        attrs.insert("error".into(), json!("Other"));
        attrs.insert("retryAfter".into(), json!(5));
        let body = ErrorBody::new("NotFound", "missing", attrs);

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"error": "NotFound", "description": "missing", "retryAfter": 5})
        );
    }
}
