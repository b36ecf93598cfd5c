//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{
    Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File, FileFormat,
};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `TABLESCOUT_` and use double underscores
    /// for nested values. For example:
    /// - `TABLESCOUT_MODEL__ENABLED=false`
    /// - `TABLESCOUT_DISCOVERY__RETRY__MAX_RETRIES=5`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // Retry defaults are nested two levels deep; set them explicitly so a
        // partial [discovery.retry] table still deserializes
        let builder = set_config_default(
            builder,
            "discovery.retry.max_retries",
            default_max_retries() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "discovery.retry.initial_delay_ms",
            default_initial_delay_ms() as i64,
        )?;
        let builder = set_config_default(
            builder,
            "discovery.retry.min_suggested_delay_ms",
            default_min_suggested_delay_ms() as i64,
        )?;
        let mut builder = set_config_default(
            builder,
            "discovery.retry.max_suggested_delay_ms",
            default_max_suggested_delay_ms() as i64,
        )?;

        // Add the config file if it exists
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        } else {
            debug!(
                "No configuration file at {}, using defaults",
                path.display()
            );
        }

        // Add environment variables with TABLESCOUT_ prefix
        builder = builder.add_source(
            Environment::with_prefix("TABLESCOUT")
                .separator("__")
                .try_parsing(true),
        );

        // Support the conventional search endpoint variable
        if let Ok(url) = std::env::var("TABLESCOUT_SEARCH_URL") {
            builder = builder
                .set_override("search.base_url", url)
                .map_err(|e| Error::config(format!("Failed to set TABLESCOUT_SEARCH_URL: {e}")))?;
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.tablescout/config.toml or custom --config path)
    /// 3. Environment variables (TABLESCOUT_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
