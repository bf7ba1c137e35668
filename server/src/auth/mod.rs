//! Event Token Authentication
//!
//! Token signing/verification and the axum middleware guarding the event
//! listener and widget URLs.

mod error;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult};
pub use jwt::{ApplicationIdentity, TokenCodec};
pub use middleware::{verify_event_token, VerifiedEventToken, MAX_EVENT_BODY_BYTES};
