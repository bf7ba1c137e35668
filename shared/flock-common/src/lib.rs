//! Flock Common Library
//!
//! Wire types shared by the webhook receiver, the method client and anything
//! that produces Flock events (test fixtures, local simulators).

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
