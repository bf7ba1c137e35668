//! Event Listener
//!
//! Receives events the Flock platform posts to the app's event listener URL,
//! hands them to the listeners registered for the event name, and answers
//! each event exactly once.

pub mod dispatcher;
pub mod extract;
pub mod handlers;
pub mod registry;
pub mod types;

use axum::{middleware::from_fn_with_state, routing::post, Router};

use crate::api::AppState;
use crate::auth::verify_event_token;

pub use dispatcher::EventDispatcher;
pub use extract::QueryEvent;
pub use registry::{EventListener, ListenerId, ListenerRegistry};
pub use types::{DeferredReply, EventReply, ListenerError, Outcome, ReplyBody};

/// Create the event listener router, mounted at `path`.
///
/// - POST {path} - Receive an event (event token verified when present)
pub fn router(state: AppState, path: &str) -> Router<AppState> {
    Router::new()
        .route(path, post(handlers::receive_event))
        .route_layer(from_fn_with_state(state, verify_event_token))
}
