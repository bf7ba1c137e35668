//! Listener Outcome and Reply Types

use std::fmt;
use std::future::Future;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flock_common::ErrorBody;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error a listener answers an event with.
///
/// Sent as `{"error": kind, "description": message, ...attributes}` with the
/// error's status, or 400 when it has none.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ListenerError {
    /// Error name, e.g. `"NotFound"`.
    pub kind: String,
    /// HTTP status to reply with.
    pub status: Option<StatusCode>,
    /// Human-readable description.
    pub message: String,
    /// Extra fields included in the reply body.
    pub attributes: Map<String, Value>,
}

impl ListenerError {
    /// Create an error without a status (replied as 400).
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status: None,
            message: message.into(),
            attributes: Map::new(),
        }
    }

    /// Set the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Add an extra field to the reply body.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Status the error is replied with.
    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::BAD_REQUEST)
    }
}

/// Body a listener answers an event with.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// Structured value.
    Json(Value),
    /// Plain text.
    Text(String),
    /// Nothing in particular; replied as `{}`.
    Empty,
}

impl From<Value> for ReplyBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for ReplyBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ReplyBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Result a deferred listener eventually produces. `Ok(None)` declines,
/// leaving the event to other listeners or the fallback.
pub type DeferredReply = BoxFuture<'static, Result<Option<ReplyBody>, ListenerError>>;

/// What a listener does with an event.
pub enum Outcome {
    /// No response from this listener.
    Pass,
    /// Respond with an error.
    Error(ListenerError),
    /// Respond with a body.
    Body(ReplyBody),
    /// Respond later, once the future completes.
    Deferred(DeferredReply),
}

impl Outcome {
    /// Respond with a JSON value.
    pub fn json(value: Value) -> Self {
        Self::Body(ReplyBody::Json(value))
    }

    /// Respond with plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Body(ReplyBody::Text(text.into()))
    }

    /// Respond with an error.
    pub fn error(error: ListenerError) -> Self {
        Self::Error(error)
    }

    /// Respond with whatever `future` resolves to, or not at all if it
    /// resolves to `Ok(None)`.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<ReplyBody>, ListenerError>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("Pass"),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Self::Body(b) => f.debug_tuple("Body").field(b).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// The single HTTP response sent for an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReply {
    /// Response status.
    pub status: StatusCode,
    /// Response body; always a JSON object/array or text.
    pub body: ReplyBody,
}

impl EventReply {
    /// `200 {}` - the reply when nobody answers.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Json(Value::Object(Map::new())),
        }
    }

    /// Reply for a listener-supplied body.
    ///
    /// Objects, arrays and strings are sent as given; anything else becomes `{}`.
    pub fn from_body(body: ReplyBody) -> Self {
        let body = match body {
            ReplyBody::Json(value @ (Value::Object(_) | Value::Array(_))) => ReplyBody::Json(value),
            ReplyBody::Json(Value::String(text)) | ReplyBody::Text(text) => ReplyBody::Text(text),
            ReplyBody::Json(_) | ReplyBody::Empty => return Self::empty(),
        };
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Reply for a listener-supplied error.
    pub fn from_error(error: &ListenerError) -> Self {
        let body = ErrorBody::new(
            error.kind.clone(),
            error.message.clone(),
            error.attributes.clone(),
        );
        Self {
            status: error.status_code(),
            body: ReplyBody::Json(serde_json::to_value(body).unwrap_or_default()),
        }
    }
}

impl IntoResponse for EventReply {
    fn into_response(self) -> Response {
        match self.body {
            ReplyBody::Json(value) => (self.status, Json(value)).into_response(),
            ReplyBody::Text(text) => (self.status, text).into_response(),
            ReplyBody::Empty => (self.status, Json(Value::Object(Map::new()))).into_response(),
        }
    }
}
