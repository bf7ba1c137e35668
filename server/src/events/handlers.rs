//! Event Listener Handler

use axum::{extract::State, Extension, Json};
use flock_common::InboundEvent;
use tracing::{debug, instrument, Span};

use super::types::EventReply;
use crate::api::AppState;
use crate::auth::VerifiedEventToken;

/// POST {events_path}
///
/// Receives one event and answers it with the reply settled by the
/// dispatcher. Runs behind the event token middleware.
#[instrument(skip_all, fields(event = tracing::field::Empty))]
pub async fn receive_event(
    State(state): State<AppState>,
    token: Option<Extension<VerifiedEventToken>>,
    Json(event): Json<InboundEvent>,
) -> EventReply {
    Span::current().record("event", event.name.as_str());
    debug!(user_id = ?event.user_id, verified = token.is_some(), "Received event");

    let claims = token.map(|Extension(VerifiedEventToken(claims))| claims);
    state.dispatcher.dispatch(event, claims).await
}
