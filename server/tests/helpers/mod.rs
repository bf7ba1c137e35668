//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router, plus
//! utilities for event tokens and response bodies.
//!
//! ## Test Servers
//!
//! Use [`spawn_test_server()`] to stand up a real HTTP server (e.g. a mock of
//! the Flock method API) instead of `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use flock_server::api::{create_router, AppState};
use flock_server::auth::{ApplicationIdentity, TokenCodec};
use flock_server::config::Config;
use flock_server::events::EventDispatcher;
use flock_server::methods::MethodInvoker;
use http_body_util::BodyExt;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Response timeout used by test apps, short enough to wait out for real.
pub const TEST_RESPONSE_TIMEOUT: Duration = Duration::from_millis(200);

/// Event token header.
pub const TOKEN_HEADER: &str = "x-flock-event-token";

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a test app with the default test config and the given dispatcher.
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self::with_config(test_config(), dispatcher)
    }

    /// Create a test app with a custom config.
    pub fn with_config(config: Config, dispatcher: EventDispatcher) -> Self {
        let methods = MethodInvoker::with_client(reqwest::Client::new(), config.api_base_url.clone());
        let state = AppState::new(config, dispatcher, methods);
        let router = create_router(state.clone());

        Self { router, state }
    }

    /// Send a request through the router.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request")
    }

    /// POST an event to the event listener, optionally with a token header.
    pub async fn post_event(&self, event: serde_json::Value, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.state.config.events_path.as_str())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }

        let request = builder
            .body(Body::from(event.to_string()))
            .expect("Failed to build request");
        self.oneshot(request).await
    }

    /// Sign a token for this app's identity.
    pub fn sign_token(&self, user_id: Option<&str>) -> String {
        self.state
            .tokens
            .sign(user_id, 3600)
            .expect("Failed to sign token")
    }
}

/// Test config with a short response timeout.
pub fn test_config() -> Config {
    Config {
        response_timeout: TEST_RESPONSE_TIMEOUT,
        ..Config::default_for_test()
    }
}

/// Dispatcher matching [`test_config`].
pub fn test_dispatcher() -> EventDispatcher {
    EventDispatcher::new(TEST_RESPONSE_TIMEOUT)
}

/// Sign a token with an arbitrary identity (forged / foreign tokens).
pub fn sign_token_as(app_id: &str, secret: &str, user_id: Option<&str>, expires_in: i64) -> String {
    TokenCodec::new(&ApplicationIdentity::new(app_id, secret))
        .sign(user_id, expires_in)
        .expect("Failed to sign token")
}

// ============================================================================
// Body helpers
// ============================================================================

/// Collect a response body into bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes()
        .to_vec()
}

/// Parse a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// Read a response body as text.
pub async fn body_to_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("Response body is not UTF-8")
}

// ============================================================================
// Test Servers
// ============================================================================

/// A running test server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub url: String,
    _handle: JoinHandle<()>,
}

/// Serve `router` on an ephemeral local port.
///
/// ```ignore
/// let server = spawn_test_server(mock_api()).await;
/// let invoker = MethodInvoker::new(format!("{}/v1", server.url), timeout)?;
/// ```
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    TestServer {
        addr,
        url,
        _handle: handle,
    }
}
