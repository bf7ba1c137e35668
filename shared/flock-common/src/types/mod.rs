//! Shared Types

pub mod event;
pub mod token;

pub use event::*;
pub use token::*;
