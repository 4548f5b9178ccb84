//! Remote error types.

use thiserror::Error;

/// Coarse classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The transport never produced a response.
    Network,
    /// The remote rejected the credentials (401/403).
    Unauthorized,
    /// The remote answered with any other error status.
    Other,
}

/// Errors that can occur when calling the remote API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Failed to send the request or read the response.
    #[error("request failed: {0}")]
    Transport(String),

    /// Request timeout.
    #[error("request timed out")]
    Timeout,

    /// Non-2xx response.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not valid JSON.
    #[error("invalid response body: {0}")]
    Body(String),
}

impl RemoteError {
    /// Classify this failure by transport outcome and status code.
    pub fn class(&self) -> ErrorClass {
        match self {
            RemoteError::Transport(_) | RemoteError::Timeout => ErrorClass::Network,
            RemoteError::Status {
                status: 401 | 403, ..
            } => ErrorClass::Unauthorized,
            RemoteError::Status { .. } | RemoteError::Body(_) => ErrorClass::Other,
        }
    }

    /// Check if the remote rejected the caller's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.class() == ErrorClass::Unauthorized
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Body(e.to_string())
    }
}
