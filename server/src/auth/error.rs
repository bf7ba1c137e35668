//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Event token verification failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signature invalid or token malformed.
    #[error("Invalid event token")]
    InvalidToken,

    /// Token has expired.
    #[error("Event token expired")]
    TokenExpired,

    /// Token was issued for a different application.
    #[error("Event token issued for another application")]
    ApplicationMismatch,

    /// Token is bound to a different user than the event.
    #[error("Event token bound to another user")]
    UserMismatch,

    /// No token on a request that requires one.
    #[error("Missing event token")]
    MissingToken,

    /// Token could not be encoded.
    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    /// Every verification failure is a bare 403; the reason stays in the logs.
    fn into_response(self) -> Response {
        StatusCode::FORBIDDEN.into_response()
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
