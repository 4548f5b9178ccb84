//! Cache error types.

use storefront_core::ValidationError;
use storefront_data::{ErrorClass, RemoteError};
use thiserror::Error;

/// Errors rejected synchronously at the cache's call boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Malformed request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Two endpoints were registered under the same name.
    #[error("endpoint registered twice: {0}")]
    DuplicateEndpoint(String),
}

/// A payload did not have the shape the endpoint's transform expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct TransformError {
    pub reason: String,
}

impl TransformError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Asynchronous failure stored on a cache entry.
///
/// Never raised across a subscription; consumers read it from
/// [`CacheEntry::error`](crate::CacheEntry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or a non-auth error status.
    #[error("network error: {message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// The remote rejected the credentials.
    #[error("unauthorized ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The payload did not match the endpoint's transform.
    #[error("transform error in {endpoint} v{version}: {reason}")]
    Transform {
        endpoint: String,
        version: u32,
        reason: String,
    },
}

impl FetchError {
    /// Classify a remote failure for the given endpoint.
    pub fn from_remote(error: RemoteError, endpoint: &str) -> Self {
        match (error.class(), error) {
            (ErrorClass::Unauthorized, RemoteError::Status { status, message }) => {
                FetchError::Auth { status, message }
            }
            (_, RemoteError::Body(reason)) => FetchError::Transform {
                endpoint: endpoint.to_string(),
                version: 0,
                reason,
            },
            (_, RemoteError::Status { status, message }) => FetchError::Network {
                status: Some(status),
                message,
            },
            (_, other) => FetchError::Network {
                status: None,
                message: other.to_string(),
            },
        }
    }

    /// Check if this is an authentication failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_remote_unauthorized() {
        let err = FetchError::from_remote(
            RemoteError::Status {
                status: 401,
                message: "bad creds".to_string(),
            },
            "login",
        );
        assert!(err.is_auth());
    }

    #[test]
    fn test_from_remote_server_error() {
        let err = FetchError::from_remote(
            RemoteError::Status {
                status: 503,
                message: "down".to_string(),
            },
            "getAllProducts",
        );
        assert_eq!(
            err,
            FetchError::Network {
                status: Some(503),
                message: "down".to_string()
            }
        );
    }

    #[test]
    fn test_from_remote_timeout() {
        let err = FetchError::from_remote(RemoteError::Timeout, "getAllProducts");
        assert!(matches!(err, FetchError::Network { status: None, .. }));
    }

    #[test]
    fn test_from_remote_bad_body() {
        let err = FetchError::from_remote(RemoteError::Body("eof".to_string()), "getAllProducts");
        assert!(matches!(err, FetchError::Transform { ref endpoint, .. } if endpoint == "getAllProducts"));
    }
}
