//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::{
    auth::{ApplicationIdentity, TokenCodec},
    config::Config,
    events::{self, EventDispatcher},
    methods::MethodInvoker,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Event token codec for this app
    pub tokens: Arc<TokenCodec>,
    /// Event dispatcher holding the registered listeners
    pub dispatcher: Arc<EventDispatcher>,
    /// Method API client
    pub methods: MethodInvoker,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: Config, dispatcher: EventDispatcher, methods: MethodInvoker) -> Self {
        let tokens = TokenCodec::new(&ApplicationIdentity::from_config(&config));
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            dispatcher: Arc::new(dispatcher),
            methods,
        }
    }
}

/// Create the main application router.
///
/// - GET /health - Health check
/// - POST {events_path} - Event listener
pub fn create_router(state: AppState) -> Router {
    let events_path = state.config.events_path.clone();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Event listener
        .merge(events::router(state.clone(), &events_path))
        // Middleware
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Crate version
    version: &'static str,
    /// Whether unauthenticated events are rejected
    require_event_token: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        require_event_token: state.config.require_event_token,
    })
}
