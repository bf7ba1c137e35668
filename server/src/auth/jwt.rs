//! Event Token Signing and Verification
//!
//! Flock signs every event it sends to an app with the app secret (HS256 JWT
//! carrying `appId` and, for user-bound events, `userId`). The same token
//! format is used when the app builds widget or browser URLs itself.

use std::fmt;

use chrono::{Duration, Utc};
use flock_common::EventTokenClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::warn;
use zeroize::Zeroizing;

use super::error::{AuthError, AuthResult};
use crate::config::Config;

/// Application ID and secret issued by the Flock developer console.
///
/// The secret is wiped from memory on drop and never shows up in `Debug`.
#[derive(Clone)]
pub struct ApplicationIdentity {
    app_id: String,
    app_secret: Zeroizing<String>,
}

impl ApplicationIdentity {
    /// Create an identity from an application ID and secret.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: Zeroizing::new(app_secret.into()),
        }
    }

    /// Build the identity from server configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.app_id.clone(), config.app_secret.clone())
    }

    /// Application ID.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl fmt::Debug for ApplicationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationIdentity")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Signs and verifies event tokens for one application.
pub struct TokenCodec {
    app_id: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec bound to the given application identity.
    pub fn new(identity: &ApplicationIdentity) -> Self {
        let secret = identity.app_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Any HMAC variant keyed with the app secret is accepted
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            app_id: identity.app_id.clone(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Application ID tokens must be issued for.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Decode and validate an event token.
    ///
    /// When `expected_user_id` is given (and non-empty) the token must be bound
    /// to that user.
    pub fn decode(
        &self,
        token: &str,
        expected_user_id: Option<&str>,
    ) -> AuthResult<EventTokenClaims> {
        let token_data = decode::<EventTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        let claims = token_data.claims;
        if claims.app_id != self.app_id {
            return Err(AuthError::ApplicationMismatch);
        }

        if let Some(expected) = expected_user_id.filter(|u| !u.is_empty()) {
            if claims.user_id.as_deref() != Some(expected) {
                return Err(AuthError::UserMismatch);
            }
        }

        Ok(claims)
    }

    /// Verify an event token, returning its claims or `None`.
    ///
    /// Forged, expired and mismatched tokens are expected on a public
    /// endpoint, so failures are logged as warnings rather than raised.
    pub fn verify(&self, token: &str, expected_user_id: Option<&str>) -> Option<EventTokenClaims> {
        match self.decode(token, expected_user_id) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!(error = %e, "Event token verification failed");
                None
            }
        }
    }

    /// Sign a token for this application, optionally bound to a user.
    ///
    /// # Arguments
    /// * `user_id` - User to bind the token to
    /// * `expires_in_seconds` - Token validity (typically 3600 = 1 hour)
    pub fn sign(&self, user_id: Option<&str>, expires_in_seconds: i64) -> AuthResult<String> {
        let now = Utc::now();
        let claims = EventTokenClaims {
            app_id: self.app_id.clone(),
            user_id: user_id.map(str::to_owned),
            iat: Some(now.timestamp()),
            exp: (now + Duration::seconds(expires_in_seconds)).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}
