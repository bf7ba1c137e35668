//! Method Call Error Types

use reqwest::{header::HeaderMap, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure of a single method call.
#[derive(Debug, Error)]
pub enum MethodCallError {
    /// The request never produced a response (connection, DNS, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response was not JSON, or not valid JSON.
    #[error(transparent)]
    UnexpectedResponse(Box<UnexpectedResponse>),

    /// The API answered with an error.
    #[error(transparent)]
    Method(Box<MethodError>),
}

impl MethodCallError {
    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::UnexpectedResponse(e) => Some(e.status),
            Self::Method(e) => Some(e.status),
        }
    }

    /// The API error, if this is one.
    pub fn as_method_error(&self) -> Option<&MethodError> {
        match self {
            Self::Method(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<UnexpectedResponse> for MethodCallError {
    fn from(err: UnexpectedResponse) -> Self {
        Self::UnexpectedResponse(Box::new(err))
    }
}

impl From<MethodError> for MethodCallError {
    fn from(err: MethodError) -> Self {
        Self::Method(Box::new(err))
    }
}

/// A response the method client could not interpret.
#[derive(Debug, Error)]
#[error("Method call received an unexpected response (HTTP {status})")]
pub struct UnexpectedResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: String,
    /// JSON parse failure, when the body claimed to be JSON.
    #[source]
    pub cause: Option<serde_json::Error>,
}

/// Error returned by the API for a method call (any status other than 200).
#[derive(Debug, Error)]
#[error(
    "{} (HTTP {status}): {}",
    .error_code.as_deref().unwrap_or("MethodError"),
    .description.as_deref().unwrap_or("no description")
)]
pub struct MethodError {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// The body's `error` field.
    pub error_code: Option<String>,
    /// The body's `description` field.
    pub description: Option<String>,
    /// Every other body field.
    pub attributes: Map<String, Value>,
}

impl MethodError {
    /// Build from an error response, consuming `error` and `description`
    /// from the body and keeping the rest as attributes.
    pub fn from_body(status: StatusCode, headers: HeaderMap, body: Value) -> Self {
        let mut attributes = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let error_code = attributes.remove("error").and_then(into_text);
        let description = attributes.remove("description").and_then(into_text);

        Self {
            status,
            headers,
            error_code,
            description,
            attributes,
        }
    }
}

fn into_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Result type for method calls.
pub type MethodResult<T> = Result<T, MethodCallError>;
