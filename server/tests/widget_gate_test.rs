//! Integration Tests for the Event Token Gate on Widget URLs
//!
//! Widget and browser URLs carry the token and the event in the query string.
//!
//! Run with: `cargo test --test widget_gate_test`

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Extension, Json, Router};
use flock_server::api::AppState;
use flock_server::auth::{verify_event_token, VerifiedEventToken};
use flock_server::config::Config;
use flock_server::events::{EventDispatcher, QueryEvent};
use flock_server::methods::MethodInvoker;
use helpers::{body_to_json, sign_token_as, test_config, test_dispatcher, TestApp};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn widget(VerifiedEventToken(claims): VerifiedEventToken, QueryEvent(event): QueryEvent) -> Json<Value> {
    Json(json!({
        "app": claims.app_id,
        "user": claims.user_id,
        "event": event.name,
    }))
}

async fn open_page(token: Option<Extension<VerifiedEventToken>>) -> Json<Value> {
    Json(json!({"verified": token.is_some()}))
}

fn widget_router(state: AppState) -> Router {
    Router::new()
        .route("/widget", get(widget))
        .route("/page", get(open_page))
        .layer(from_fn_with_state(state.clone(), verify_event_token))
        .with_state(state)
}

/// Build `/path?flockEventToken=..&flockEvent=..` with proper escaping.
fn widget_uri(path: &str, token: Option<&str>, event: Option<&str>) -> String {
    let mut url = reqwest::Url::parse(&format!("http://localhost{path}")).unwrap();
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(token) = token {
            pairs.append_pair("flockEventToken", token);
        }
        if let Some(event) = event {
            pairs.append_pair("flockEvent", event);
        }
    }
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

async fn send_get(router: &Router, uri: String) -> axum::http::Response<Body> {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn open_widget_event(user_id: &str) -> String {
    json!({"name": "client.openAttachmentWidget", "userId": user_id}).to_string()
}

#[tokio::test]
async fn test_widget_with_valid_token() {
    let app = TestApp::new(test_dispatcher());
    let router = widget_router(app.state.clone());
    let token = app.sign_token(Some("u:alice"));

    let uri = widget_uri("/widget", Some(&token), Some(&open_widget_event("u:alice")));
    let response = send_get(&router, uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_to_json(response).await,
        json!({"app": "test-app", "user": "u:alice", "event": "client.openAttachmentWidget"})
    );
}

#[tokio::test]
async fn test_widget_event_for_other_user_rejected() {
    let app = TestApp::new(test_dispatcher());
    let router = widget_router(app.state.clone());
    let token = app.sign_token(Some("u:alice"));

    let uri = widget_uri("/widget", Some(&token), Some(&open_widget_event("u:mallory")));
    let response = send_get(&router, uri).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_event_ignored_by_gate() {
    let app = TestApp::new(test_dispatcher());
    let router = widget_router(app.state.clone());
    let token = app.sign_token(Some("u:alice"));

    // The gate verifies the token alone; the extractor then rejects the event
    let uri = widget_uri("/widget", Some(&token), Some("{not json"));
    let response = send_get(&router, uri).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = widget_uri("/page", Some(&token), Some("{not json"));
    let response = send_get(&router, uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await, json!({"verified": true}));
}

#[tokio::test]
async fn test_widget_without_token_is_rejected_by_extractor() {
    let app = TestApp::new(test_dispatcher());
    let router = widget_router(app.state.clone());

    let uri = widget_uri("/widget", None, Some(&open_widget_event("u:alice")));
    let response = send_get(&router, uri).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = widget_uri("/page", None, None);
    let response = send_get(&router, uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await, json!({"verified": false}));
}

#[tokio::test]
async fn test_gate_runs_once_when_stacked() {
    let app = TestApp::new(test_dispatcher());

    // Inner gate has the wrong secret; it must not re-check a verified request
    let inner_config = Config {
        app_secret: "some-other-secret".into(),
        ..test_config()
    };
    let inner_state = AppState::new(
        inner_config,
        EventDispatcher::default(),
        MethodInvoker::with_client(reqwest::Client::new(), "http://localhost"),
    );

    let router = Router::new()
        .route("/page", get(open_page))
        .layer(from_fn_with_state(inner_state, verify_event_token))
        .layer(from_fn_with_state(app.state.clone(), verify_event_token));

    let token = app.sign_token(Some("u:alice"));
    let uri = widget_uri("/page", Some(&token), Some(&open_widget_event("u:alice")));
    let response = send_get(&router, uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await, json!({"verified": true}));
}

#[tokio::test]
async fn test_widget_forged_token_rejected() {
    let app = TestApp::new(test_dispatcher());
    let router = widget_router(app.state.clone());
    let forged = sign_token_as("test-app", "guessed", Some("u:alice"), 3600);

    let uri = widget_uri("/page", Some(&forged), None);
    let response = send_get(&router, uri).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
