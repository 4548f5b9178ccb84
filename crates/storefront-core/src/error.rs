//! Shared error types.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed caller input, rejected synchronously before any remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// No endpoint is registered under this name.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// The endpoint exists but cannot be used this way.
    #[error("endpoint {endpoint} is a {actual}, not a {expected}")]
    WrongEndpointKind {
        endpoint: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A path parameter required by the endpoint was not supplied.
    #[error("missing parameter `{param}` for endpoint {endpoint}")]
    MissingParam { endpoint: String, param: String },

    /// A parameter was supplied with an empty name or value.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParam { name: String, reason: String },
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse failure.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse failure.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid config value: {0}")]
    Invalid(String),
}
