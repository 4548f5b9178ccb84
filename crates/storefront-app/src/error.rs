//! Application-level errors.

use storefront_auth::SessionError;
use storefront_cache::{CacheError, FetchError};
use storefront_commerce::CommerceError;
use storefront_core::ValidationError;
use storefront_data::RemoteError;
use thiserror::Error;

/// Errors from building the context or dispatching an intent.
#[derive(Error, Debug)]
pub enum AppError {
    /// The resource cache rejected a request or its setup.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The session container rejected an intent.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The cart rejected an add.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// The remote transport could not be created.
    #[error("remote setup failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Why a login attempt did not produce an authenticated session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The remote rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Blank username or password, or a missing token in the response.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A session in this phase cannot start a login.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The cache refused the login or profile request.
    #[error(transparent)]
    Request(#[from] CacheError),

    /// Any other failure: transport, transform or the profile fetch.
    #[error("login failed: {0}")]
    Failed(FetchError),
}

impl LoginError {
    /// Message shown next to the login form.
    pub fn field_message(&self) -> &'static str {
        match self {
            LoginError::InvalidCredentials => "Invalid username or password",
            LoginError::Validation(ValidationError::Empty("username")) => "Username is required",
            LoginError::Validation(ValidationError::Empty("password")) => "Password is required",
            _ => "Login failed. Please try again.",
        }
    }
}

impl From<FetchError> for LoginError {
    fn from(error: FetchError) -> Self {
        if error.is_auth() {
            LoginError::InvalidCredentials
        } else {
            LoginError::Failed(error)
        }
    }
}
