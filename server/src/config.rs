//! Server Configuration
//!
//! Loads configuration from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default base URL of the Flock method API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.flock.co/v1";

/// Default time the event listener waits for a deferred listener outcome.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default request timeout for outbound method calls.
pub const DEFAULT_METHOD_TIMEOUT: Duration = Duration::from_secs(30);

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Flock application ID
    pub app_id: String,

    /// Flock application secret (signs event tokens)
    pub app_secret: String,

    /// Base URL for method calls (default: <https://api.flock.co/v1>)
    pub api_base_url: String,

    /// How long the event listener waits for a deferred response (default: 60s)
    pub response_timeout: Duration,

    /// Reject events that carry no event token (default: false)
    pub require_event_token: bool,

    /// Path the event listener is mounted at (default: "/events")
    pub events_path: String,

    /// Request timeout for outbound method calls (default: 30s)
    pub method_timeout: Duration,

    /// Bot token used by the bundled host to answer messages (optional)
    pub bot_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            app_id: env::var("FLOCK_APP_ID").context("FLOCK_APP_ID must be set")?,
            app_secret: env::var("FLOCK_APP_SECRET").context("FLOCK_APP_SECRET must be set")?,
            api_base_url: env::var("FLOCK_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.into()),
            response_timeout: env::var("FLOCK_RESPONSE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(DEFAULT_RESPONSE_TIMEOUT, Duration::from_millis),
            require_event_token: env::var("FLOCK_REQUIRE_EVENT_TOKEN")
                .ok()
                .is_some_and(|v| parse_bool(&v)),
            events_path: env::var("FLOCK_EVENTS_PATH")
                .map(|p| normalize_path(&p))
                .unwrap_or_else(|_| "/events".into()),
            method_timeout: env::var("FLOCK_METHOD_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(DEFAULT_METHOD_TIMEOUT, Duration::from_secs),
            bot_token: env::var("FLOCK_BOT_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            app_id: "test-app".into(),
            app_secret: "test-secret".into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            require_event_token: false,
            events_path: "/events".into(),
            method_timeout: DEFAULT_METHOD_TIMEOUT,
            bot_token: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("response_timeout", &self.response_timeout)
            .field("require_event_token", &self.require_event_token)
            .field("events_path", &self.events_path)
            .field("method_timeout", &self.method_timeout)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
