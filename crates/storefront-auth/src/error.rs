//! Authentication errors.

use std::path::PathBuf;

use storefront_core::ValidationError;
use thiserror::Error;

use crate::SessionPhase;

/// Durable storage failure.
///
/// Never surfaces past the session container; a failed read is treated as
/// "no session".
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing file could not be read or written.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data is not in the expected format.
    #[error("malformed stored data: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Malformed(e.to_string())
    }
}

/// Rejected session intent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The intent is not valid in the current phase.
    #[error("cannot {intent} while {from}")]
    InvalidTransition {
        from: SessionPhase,
        intent: &'static str,
    },

    /// Malformed intent payload.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
