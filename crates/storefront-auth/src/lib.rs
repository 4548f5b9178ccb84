//! Authentication state for the storefront.
//!
//! This crate provides:
//! - `SessionContainer` - The session state machine, hydrated from storage
//! - `DurableStorage` - Key/value storage that survives restarts
//! - `User` / `LoginCredentials` / `LoginResponse` - Auth payloads
//! - `endpoints` - The `login` mutation and `getCurrentUser` query

mod container;
mod endpoints;
mod error;
mod session;
mod storage;
mod user;

pub use container::{SessionContainer, SessionEvent, SessionIntent};
pub use endpoints::{endpoints, login_request, GET_CURRENT_USER, LOGIN, USERS_TAG};
pub use error::{SessionError, StorageError};
pub use session::{AccessDecision, Session, SessionPhase, LOGIN_ROUTE};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, AUTH_TOKEN_KEY, USER_KEY};
pub use user::{LoginCredentials, LoginResponse, User};
