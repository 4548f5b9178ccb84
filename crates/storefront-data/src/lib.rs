//! Remote resource boundary.
//!
//! The state engine treats the remote API as opaque async operations
//! identified by method, path and parameters. This crate provides:
//! - `Remote` - The async transport seam
//! - `RemoteCall` / `Method` - A single outbound operation
//! - `RemoteError` - Failures with a status classification
//! - `HttpRemote` - reqwest-backed implementation
//! - `MockRemote` - Scriptable in-memory implementation (development/testing)

mod client;
mod error;
pub mod mock;
mod request;

pub use client::{HttpRemote, Remote};
pub use error::{ErrorClass, RemoteError};
pub use mock::MockRemote;
pub use request::{Method, RemoteCall};
