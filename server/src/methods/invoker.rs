//! Method Invoker
//!
//! Calls a Flock API method: `POST {base_url}/{method}` with the parameters
//! form-encoded and the caller's token added as `token`.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    StatusCode,
};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use super::error::{MethodError, MethodResult, UnexpectedResponse};
use crate::config::Config;

/// Method parameters.
pub type Parameters = Map<String, Value>;

/// Name of the parameter carrying the caller's token.
const TOKEN_PARAM: &str = "token";

/// HTTP client for Flock API methods.
#[derive(Debug, Clone)]
pub struct MethodInvoker {
    client: reqwest::Client,
    base_url: String,
}

impl MethodInvoker {
    /// Create an invoker with its own HTTP client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> MethodResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create an invoker from server configuration.
    pub fn from_config(config: &Config) -> MethodResult<Self> {
        Self::new(config.api_base_url.clone(), config.method_timeout)
    }

    /// Create an invoker sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut invoker = Self {
            client,
            base_url: String::new(),
        };
        invoker.set_base_url(base_url);
        invoker
    }

    /// Base URL methods are called under.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Point the invoker at another API base URL.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
    }

    /// Build the URL for a method.
    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Call `method` with `token` and `parameters`.
    ///
    /// Never panics on bad responses: transport failures, non-JSON bodies and
    /// API errors all come back as [`super::MethodCallError`].
    #[instrument(skip(self, token, parameters))]
    pub async fn invoke(
        &self,
        method: &str,
        token: &str,
        parameters: Parameters,
    ) -> MethodResult<Value> {
        let form = encode_parameters(token, parameters);

        let response = self.client.post(self.url(method)).form(&form).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        let result = classify_response(status, headers, body);
        match &result {
            Ok(_) => debug!(%status, "Method call succeeded"),
            Err(e) => warn!(%status, error = %e, "Method call failed"),
        }
        result
    }
}

/// Flatten parameters into form fields.
///
/// Strings are sent as-is; every other value (numbers, booleans, null,
/// objects, arrays) is sent as its JSON text. Any caller-supplied `token` is
/// replaced by `token`.
pub fn encode_parameters(token: &str, parameters: Parameters) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = parameters
        .into_iter()
        .filter(|(key, _)| key != TOKEN_PARAM)
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect();

    form.push((TOKEN_PARAM.to_string(), token.to_string()));
    form
}

/// Classify a method response.
///
/// Non-JSON (or unparseable) bodies are unexpected regardless of status; a
/// JSON body is the result on 200 and an API error otherwise.
pub fn classify_response(status: StatusCode, headers: HeaderMap, body: String) -> MethodResult<Value> {
    if !is_json(&headers) {
        return Err(UnexpectedResponse {
            status,
            headers,
            body,
            cause: None,
        }
        .into());
    }

    let json: Value = match serde_json::from_str(&body) {
        Ok(json) => json,
        Err(e) => {
            return Err(UnexpectedResponse {
                status,
                headers,
                body,
                cause: Some(e),
            }
            .into())
        }
    };

    if status == StatusCode::OK {
        Ok(json)
    } else {
        Err(MethodError::from_body(status, headers, json).into())
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}
