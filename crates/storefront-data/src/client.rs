//! Remote transport seam and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use storefront_core::ApiConfig;

use crate::{RemoteCall, RemoteError};

/// Async transport to the remote API.
///
/// Implementations return the raw JSON payload; shaping it is the cache's
/// job.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn send(&self, call: RemoteCall) -> Result<Value, RemoteError>;
}

/// reqwest-backed remote.
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a remote for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a remote from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, RemoteError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn send(&self, call: RemoteCall) -> Result<Value, RemoteError> {
        let url = call.url(&self.base_url);
        tracing::debug!(method = %call.method, %url, "remote call");

        let mut request = self
            .client
            .request(call.method.into(), &url)
            .query(&call.query);
        if let Some(token) = &call.bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let remote = HttpRemote::from_config(&ApiConfig::default()).unwrap();
        assert_eq!(remote.base_url(), "https://fakestoreapi.com");
    }
}
