//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use storefront_app::AppContext;
use storefront_auth::FileStorage;
use storefront_core::{logging, StorefrontConfig};

use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Everything a command needs.
pub struct Setup {
    pub app: AppContext,
    pub output: Output,
    pub storage_path: PathBuf,
}

impl Setup {
    /// Load config, install logging and build the hydrated app context.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let config = match config_path {
            Some(path) => StorefrontConfig::load(path)
                .with_context(|| format!("Failed to load config from {path}"))?,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                find_config(&cwd).unwrap_or_default()
            }
        }
        .with_env_overrides();
        config.validate().context("Invalid configuration")?;

        logging::init(&config.logging);

        let storage_path = config
            .storage
            .resolve_path()
            .context("No session storage location; set storage.path")?;
        let storage = Arc::new(FileStorage::new(storage_path.clone()));

        let app = AppContext::from_config(config, storage).context("Failed to build app context")?;
        let session = app.hydrate();
        tracing::debug!(phase = %session.phase(), path = %storage_path.display(), "session hydrated");

        Ok(Self {
            app,
            output,
            storage_path,
        })
    }
}

/// Find a config file in the directory tree.
fn find_config(start: &Path) -> Option<StorefrontConfig> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.exists() {
                match StorefrontConfig::load(&candidate) {
                    Ok(config) => return Some(config),
                    Err(error) => {
                        tracing::warn!(path = %candidate.display(), %error, "skipping config file")
                    }
                }
            }
        }
        if !current.pop() {
            return None;
        }
    }
}
