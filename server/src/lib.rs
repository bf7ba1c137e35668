//! Flock App SDK
//!
//! Everything a Flock app backend needs to talk to the platform:
//!
//! - [`auth`]: event token verification (and signing for widget URLs)
//! - [`events`]: the event listener endpoint and listener registration
//! - [`methods`]: the method API client
//!
//! ```ignore
//! let config = Config::from_env()?;
//! let dispatcher = EventDispatcher::from_config(&config);
//! dispatcher.on(names::APP_INSTALL, |event, _| {
//!     tracing::info!(user_id = ?event.user_id, "Installed");
//!     Outcome::Pass
//! });
//! let methods = MethodInvoker::from_config(&config)?;
//! let app = api::create_router(AppState::new(config, dispatcher, methods));
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod methods;

pub use flock_common as common;
