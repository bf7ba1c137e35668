//! Flock App Server - Main Entry Point
//!
//! Reference event listener host: logs installs, answers slash commands and
//! echoes bot messages through `chat.sendMessage`.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use tracing::{error, info};

use flock_server::{
    api::{self, AppState},
    common::names,
    config,
    events::{EventDispatcher, ListenerError, Outcome, ReplyBody},
    methods::{params, MethodInvoker},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flock_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        app_id = %config.app_id,
        "Starting Flock app server"
    );

    let methods = MethodInvoker::from_config(&config)?;
    let dispatcher = EventDispatcher::from_config(&config);
    register_listeners(&dispatcher, &methods, config.bot_token.clone());

    let bind_address = config.bind_address.clone();
    let events_path = config.events_path.clone();
    let app = api::create_router(AppState::new(config, dispatcher, methods));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, events_path = %events_path, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Listeners of the reference host.
fn register_listeners(
    dispatcher: &EventDispatcher,
    methods: &MethodInvoker,
    bot_token: Option<String>,
) {
    dispatcher.on(names::APP_INSTALL, |event, _| {
        info!(user_id = ?event.user_id, "App installed");
        Outcome::Pass
    });

    dispatcher.on(names::APP_UNINSTALL, |event, _| {
        info!(user_id = ?event.user_id, "App uninstalled");
        Outcome::Pass
    });

    dispatcher.on(names::CLIENT_SLASH_COMMAND, |event, _| {
        let text = event.get("text").and_then(|t| t.as_str()).unwrap_or_default();
        Outcome::json(json!({ "text": format!("Received: {text}") }))
    });

    let Some(bot_token) = bot_token else {
        info!("FLOCK_BOT_TOKEN not set, message echo disabled");
        return;
    };

    let methods = methods.clone();
    dispatcher.on(names::CHAT_RECEIVE_MESSAGE, move |event, _| {
        let message = event.get("message");
        let from = message.and_then(|m| m.get("from")).and_then(|v| v.as_str());
        let text = message.and_then(|m| m.get("text")).and_then(|v| v.as_str());
        let (Some(from), Some(text)) = (from, text) else {
            return Outcome::Pass;
        };

        let methods = methods.clone();
        let bot_token = bot_token.clone();
        let parameters = params(json!({ "to": from, "text": text }));
        Outcome::deferred(async move {
            methods
                .chat()
                .send_message(&bot_token, parameters)
                .await
                .map(|_| Some(ReplyBody::Empty))
                .map_err(|e| {
                    ListenerError::new("EchoFailed", e.to_string())
                        .with_status(StatusCode::BAD_GATEWAY)
                })
        })
    });
}
