//! Configuration for the publish pipeline.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! explicit config file -> environment. Environment variables are prefixed
//! with `MODELPRESS_` (e.g. `MODELPRESS_STORE_URL`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// Top-level configuration for the publish pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Destination store URL (`gs://bucket`, `s3://bucket`, `file:///path`,
    /// or `memory:` for tests).
    #[serde(default = "default_store_url")]
    pub store_url: String,
    /// Version segment of the object key (`{name}/v{version}/...`).
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL of the model hub weights are fetched from.
    #[serde(default = "default_hub_base_url")]
    pub hub_base_url: String,
    /// Scratch directory for downloads and conversions (system temp dir if unset).
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// HTTP timeout for hub downloads (seconds). Covers the whole transfer.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// Keep per-model scratch files after publishing.
    #[serde(default)]
    pub keep_scratch: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            store_url: default_store_url(),
            version: default_version(),
            hub_base_url: default_hub_base_url(),
            scratch_dir: None,
            http_timeout_secs: default_http_timeout(),
            keep_scratch: false,
        }
    }
}

fn default_store_url() -> String {
    "gs://torchtransformers-models".to_string()
}

fn default_version() -> String {
    "1".to_string()
}

fn default_hub_base_url() -> String {
    "https://huggingface.co".to_string()
}

fn default_http_timeout() -> u64 {
    3600
}

impl PublishConfig {
    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.store_url.is_empty() {
            return Err(PublishError::config("store_url must not be empty"));
        }
        if self.version.is_empty() {
            return Err(PublishError::config("version must not be empty"));
        }
        if self.version.contains('/') {
            return Err(PublishError::config("version must not contain '/'"));
        }
        if self.hub_base_url.is_empty() {
            return Err(PublishError::config("hub_base_url must not be empty"));
        }
        if self.http_timeout_secs == 0 {
            return Err(PublishError::config("http_timeout_secs must be positive"));
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `MODELPRESS_`)
/// 2. Explicit config file (passed as argument)
/// 3. User config (`~/.config/modelpress/config.toml`)
/// 4. Built-in defaults
pub fn load_config(config_file: Option<&Path>) -> Result<PublishConfig> {
    let mut figment = Figment::from(Serialized::defaults(PublishConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "modelpress", "modelpress") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Explicit config file
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(PublishError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (MODELPRESS_STORE_URL, MODELPRESS_VERSION, etc.)
    figment = figment.merge(Env::prefixed("MODELPRESS_").split("__"));

    let config: PublishConfig = figment
        .extract()
        .map_err(|e| PublishError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
