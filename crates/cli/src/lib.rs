//! Library interface for the tablescout CLI
//!
//! Input loading and component wiring live here so they can be tested
//! without running the binary.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tablescout_core::config::Config;
use tablescout_discovery::{create_completion_model, DiscoveryOrchestrator, TargetColumn};
use tablescout_search_client::create_search_backend;
use tracing::info;

/// Target schema file shapes: a bare column array or `{"columns": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetSchemaFile {
    Columns(Vec<TargetColumn>),
    Wrapped { columns: Vec<TargetColumn> },
}

/// Read a PRP markdown file
pub fn read_prp(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read PRP file {}", path.display()))
}

/// Read a target schema JSON file
pub fn read_target_schema(path: &Path) -> Result<Vec<TargetColumn>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    let parsed: TargetSchemaFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid target schema in {}", path.display()))?;

    let columns = match parsed {
        TargetSchemaFile::Columns(columns) | TargetSchemaFile::Wrapped { columns } => columns,
    };
    if columns.is_empty() {
        anyhow::bail!("Target schema in {} has no columns", path.display());
    }
    Ok(columns)
}

/// Load and validate configuration
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Build the orchestrator with the configured model and search backend
pub fn build_orchestrator(config: &Config) -> Result<DiscoveryOrchestrator> {
    let model = create_completion_model(&config.model)?;
    let backend = create_search_backend(&config.search)?;
    info!(
        "Search backend: {} at {}",
        config.search.provider, config.search.base_url
    );
    Ok(DiscoveryOrchestrator::new(config, model, backend)?)
}
