//! Event Token Types

use serde::{Deserialize, Serialize};

/// Header carrying the event token on requests to the event listener URL.
pub const EVENT_TOKEN_HEADER: &str = "x-flock-event-token";

/// Query parameter carrying the event token on widget and browser URLs.
pub const EVENT_TOKEN_QUERY_PARAM: &str = "flockEventToken";

/// Query parameter carrying the JSON-encoded event on widget and browser URLs.
pub const EVENT_QUERY_PARAM: &str = "flockEvent";

/// Claims carried by a Flock event token (HS256 JWT signed with the app secret).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTokenClaims {
    /// Application the token was issued for.
    #[serde(rename = "appId")]
    pub app_id: String,
    /// User the token is bound to, if any.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Issued at (Unix timestamp), when the issuer set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}
