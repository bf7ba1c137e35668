//! Common Error Types

use thiserror::Error;

/// Errors raised while decoding shared wire types.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload is not a valid Flock event.
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

/// Result type for common operations.
pub type Result<T> = std::result::Result<T, Error>;
