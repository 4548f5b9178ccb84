//! Storefront configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "STOREFRONT_API_URL";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG: &str = "STOREFRONT_LOG";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Resource cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Durable session storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `STOREFRONT_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_LOG).ok(),
        )
    }

    fn with_overrides(mut self, api_url: Option<String>, log: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(level) = log.filter(|l| !l.trim().is_empty()) {
            self.logging.level = level;
        }
        self
    }

    /// Check values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".to_string()));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Invalid("api.timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fakestoreapi.com".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Resource cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether entries with no subscribers are evicted automatically.
    pub evict_unused: bool,
    /// Seconds an entry with no subscribers is kept before eviction.
    pub keep_unused_for_secs: u64,
}

impl CacheConfig {
    /// Eviction delay, or `None` when unused entries are only removed by an
    /// explicit sweep.
    pub fn keep_unused_for(&self) -> Option<Duration> {
        self.evict_unused
            .then(|| Duration::from_secs(self.keep_unused_for_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            evict_unused: true,
            keep_unused_for_secs: 60,
        }
    }
}

/// Durable session storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Session file. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the session file location.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "storefront", "storefront")
                .map(|dirs| dirs.data_dir().join("session.json"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.api.base_url, "https://fakestoreapi.com");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.keep_unused_for(), Some(Duration::from_secs(60)));
        assert_eq!(config.logging.format, LogFormat::Human);
    }

    #[test]
    fn test_load_toml_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://localhost:3000\"\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = StorefrontConfig::load(&path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.json");
        std::fs::write(&path, r#"{"cache": {"evict_unused": false}}"#).unwrap();

        let config = StorefrontConfig::load(&path).unwrap();
        assert_eq!(config.cache.keep_unused_for(), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StorefrontConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = StorefrontConfig::default();
        config.api.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::default()
            .with_overrides(Some("http://mock".to_string()), Some(" ".to_string()));
        assert_eq!(config.api.base_url, "http://mock");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_storage_explicit_path() {
        let storage = StorageConfig {
            path: Some(PathBuf::from("/tmp/s.json")),
        };
        assert_eq!(storage.resolve_path(), Some(PathBuf::from("/tmp/s.json")));
    }
}
