//! Event Token Middleware
//!
//! Verifies the event token on requests to the event listener and on widget /
//! browser URLs opened by the Flock client.

use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    extract::{Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use flock_common::{EventTokenClaims, EVENT_QUERY_PARAM, EVENT_TOKEN_HEADER, EVENT_TOKEN_QUERY_PARAM};
use tracing::{debug, warn};

use super::error::AuthError;
use crate::api::AppState;

/// Largest event body the token gate will buffer to read the `userId`.
pub const MAX_EVENT_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Claims of a verified event token, injected into request extensions.
///
/// Absent when the request carried no token and tokens are optional.
#[derive(Debug, Clone)]
pub struct VerifiedEventToken(pub EventTokenClaims);

/// Middleware that verifies the event token, if any.
///
/// The token is read from the `x-flock-event-token` header, falling back to
/// the `flockEventToken` query parameter. If the event names a user (JSON body
/// or `flockEvent` query parameter), the token must be bound to that user.
///
/// Requests without a token pass through unless `require_event_token` is set.
/// A request that was already verified further up the stack is not checked
/// again.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/widget", get(widget))
///     .layer(axum::middleware::from_fn_with_state(state, verify_event_token))
/// ```
pub async fn verify_event_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<VerifiedEventToken>().is_some() {
        return next.run(request).await;
    }

    let query = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map(|q| q.0)
        .unwrap_or_default();

    let Some(token) = extract_token(request.headers(), &query) else {
        if state.config.require_event_token {
            warn!("Rejected request without event token");
            return AuthError::MissingToken.into_response();
        }
        return next.run(request).await;
    };

    let (mut request, user_id) = if is_json(request.headers()) {
        match user_id_from_body(request).await {
            Ok(buffered) => buffered,
            Err(response) => return response,
        }
    } else {
        let user_id = query
            .get(EVENT_QUERY_PARAM)
            .and_then(|raw| user_id_from_json(raw.as_bytes()));
        (request, user_id)
    };

    let Some(claims) = state.tokens.verify(&token, user_id.as_deref()) else {
        return AuthError::InvalidToken.into_response();
    };

    debug!(app_id = %claims.app_id, user_id = ?claims.user_id, "Event token verified");
    request.extensions_mut().insert(VerifiedEventToken(claims));

    next.run(request).await
}

/// Extractor for handlers that only serve verified requests.
///
/// ```ignore
/// async fn widget(VerifiedEventToken(claims): VerifiedEventToken) -> impl IntoResponse {
///     format!("Hello, {}!", claims.user_id.unwrap_or_default())
/// }
/// ```
impl<S> axum::extract::FromRequestParts<S> for VerifiedEventToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Pull the event token from the header, then the query string.
fn extract_token(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    headers
        .get(EVENT_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            query
                .get(EVENT_TOKEN_QUERY_PARAM)
                .filter(|t| !t.is_empty())
                .cloned()
        })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Buffer the body, read `userId` from it, and hand back a rebuilt request.
async fn user_id_from_body(request: Request) -> Result<(Request, Option<String>), Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_EVENT_BODY_BYTES).await.map_err(|e| {
        warn!(error = %e, "Failed to buffer event body");
        StatusCode::PAYLOAD_TOO_LARGE.into_response()
    })?;

    let user_id = user_id_from_json(&bytes);
    Ok((Request::from_parts(parts, Body::from(bytes)), user_id))
}

/// `userId` of a JSON-encoded event; anything unparseable yields `None`.
fn user_id_from_json(raw: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(raw)
        .ok()?
        .get("userId")?
        .as_str()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_TOKEN_HEADER, HeaderValue::from_static("from-header"));
        let query = HashMap::from([(EVENT_TOKEN_QUERY_PARAM.to_string(), "from-query".to_string())]);

        assert_eq!(extract_token(&headers, &query).as_deref(), Some("from-header"));
        assert_eq!(
            extract_token(&HeaderMap::new(), &query).as_deref(),
            Some("from-query")
        );
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_TOKEN_HEADER, HeaderValue::from_static(""));
        assert!(extract_token(&headers, &HashMap::new()).is_none());
    }

    #[test]
    fn json_content_type_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[test]
    fn user_id_from_json_ignores_malformed_input() {
        assert_eq!(
            user_id_from_json(br#"{"name":"x","userId":"u:1"}"#).as_deref(),
            Some("u:1")
        );
        assert!(user_id_from_json(b"{broken").is_none());
        assert!(user_id_from_json(br#"{"userId":42}"#).is_none());
    }
}
