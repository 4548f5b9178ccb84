//! Core abstractions for the storefront state engine.
//!
//! This crate provides the pieces every container shares:
//! - `EventBus` / `Subscription` - Synchronous fan-out of state changes
//! - `Notifier` - Transient UI notifications (toasts)
//! - `StorefrontConfig` - File and environment configuration
//! - `ValidationError` - Caller input rejected at the call boundary
//! - `logging` - `tracing` subscriber bootstrap

mod bus;
mod config;
mod error;
pub mod logging;
mod notify;

pub use bus::*;
pub use config::*;
pub use error::*;
pub use logging::{LogFormat, LoggingConfig};
pub use notify::*;
