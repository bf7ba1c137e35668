//! Request Extractors

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
};
use flock_common::{InboundEvent, EVENT_QUERY_PARAM};

/// Event carried in the `flockEvent` query parameter of widget and browser
/// URLs opened by the Flock client.
///
/// Combine with the event token middleware to trust its contents.
#[derive(Debug, Clone)]
pub struct QueryEvent(pub InboundEvent);

impl<S> FromRequestParts<S> for QueryEvent
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid query string"))?;

        let raw = query
            .get(EVENT_QUERY_PARAM)
            .ok_or((StatusCode::BAD_REQUEST, "Missing flockEvent parameter"))?;

        InboundEvent::from_json_str(raw)
            .map(Self)
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid flockEvent parameter"))
    }
}
