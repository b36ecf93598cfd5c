//! Configuration module for the tablescout system
//!
//! This module provides configuration structures and loading mechanisms for
//! table discovery. Configuration can be loaded from TOML files and/or
//! environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.tablescout/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".tablescout").join("config.toml"))
}

/// Main configuration structure for the tablescout system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Search backend configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Discovery orchestration knobs
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Configuration for the hosted completion model
///
/// When `enabled` is false every LLM-backed component degrades to its
/// deterministic fallback.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_enabled")]
    pub enabled: bool,

    /// Provider type: "anthropic" (default)
    #[serde(default = "default_model_provider")]
    pub provider: String,

    /// Model name to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (or use ANTHROPIC_API_KEY env var)
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ModelConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }
}

/// Configuration for the table search backend
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider type: "http" (default)
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Base URL of the search service; requests go to `{base_url}/search`
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Bearer token for the search service
    pub api_key: Option<String>,

    /// Results requested per query
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,

    /// Ask the backend to inline full table content in each hit
    #[serde(default)]
    pub include_full_content: bool,

    /// Maximum concurrent HTTP requests to the backend
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("include_full_content", &self.include_full_content)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .finish()
    }
}

/// Discovery orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Upper bound on planned queries in keyword-list mode
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,

    /// Hits kept per query after the backend responds
    #[serde(default = "default_top_k_per_query")]
    pub top_k_per_query: usize,

    /// Fan-out escalation triggers below this many deduplicated candidates
    #[serde(default = "default_min_candidates_before_fanout")]
    pub min_candidates_before_fanout: usize,

    /// Number of broader queries requested on fan-out
    #[serde(default = "default_fanout_query_count")]
    pub fanout_query_count: usize,

    /// Candidates scoring below this are dropped (0-100)
    #[serde(default = "default_min_relevance_score")]
    pub min_relevance_score: f64,

    /// Maximum candidates returned to the caller
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Flat score assigned to every candidate when the model is disabled
    #[serde(default = "default_disabled_model_score")]
    pub disabled_model_score: f64,

    #[serde(default = "default_max_concurrent_searches")]
    pub max_concurrent_searches: usize,

    #[serde(default = "default_max_concurrent_model_calls")]
    pub max_concurrent_model_calls: usize,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Backoff policy for rate-limited model calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay; attempt `n` waits `initial_delay_ms * 2^n`
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Server-suggested delays outside [min, max] are ignored
    #[serde(default = "default_min_suggested_delay_ms")]
    pub min_suggested_delay_ms: u64,

    #[serde(default = "default_max_suggested_delay_ms")]
    pub max_suggested_delay_ms: u64,
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn suggested_delay_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_suggested_delay_ms),
            Duration::from_millis(self.max_suggested_delay_ms),
        )
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: default_model_enabled(),
            provider: default_model_provider(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            base_url: default_search_base_url(),
            api_key: None,
            page_size: default_page_size(),
            timeout_secs: default_search_timeout_secs(),
            include_full_content: false,
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_queries: default_max_queries(),
            top_k_per_query: default_top_k_per_query(),
            min_candidates_before_fanout: default_min_candidates_before_fanout(),
            fanout_query_count: default_fanout_query_count(),
            min_relevance_score: default_min_relevance_score(),
            max_results: default_max_results(),
            disabled_model_score: default_disabled_model_score(),
            max_concurrent_searches: default_max_concurrent_searches(),
            max_concurrent_model_calls: default_max_concurrent_model_calls(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            min_suggested_delay_ms: default_min_suggested_delay_ms(),
            max_suggested_delay_ms: default_max_suggested_delay_ms(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_model_providers = ["anthropic"];
        if !valid_model_providers.contains(&self.model.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid model provider '{}'. Must be one of: {:?}",
                self.model.provider, valid_model_providers
            )));
        }

        if !(0.0..=1.0).contains(&self.model.temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0.0 and 1.0, got {}",
                self.model.temperature
            )));
        }

        let valid_search_providers = ["http"];
        if !valid_search_providers.contains(&self.search.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid search provider '{}'. Must be one of: {:?}",
                self.search.provider, valid_search_providers
            )));
        }

        if self.search.page_size == 0 {
            return Err(Error::config(
                "search.page_size must be greater than 0".to_string(),
            ));
        }

        self.discovery.validate()
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_queries == 0 {
            return Err(Error::config(
                "discovery.max_queries must be greater than 0".to_string(),
            ));
        }
        if self.top_k_per_query == 0 {
            return Err(Error::config(
                "discovery.top_k_per_query must be greater than 0".to_string(),
            ));
        }
        if self.min_candidates_before_fanout == 0 {
            return Err(Error::config(
                "discovery.min_candidates_before_fanout must be greater than 0".to_string(),
            ));
        }
        for (name, score) in [
            ("min_relevance_score", self.min_relevance_score),
            ("disabled_model_score", self.disabled_model_score),
        ] {
            if !(0.0..=100.0).contains(&score) {
                return Err(Error::config(format!(
                    "discovery.{name} must be between 0 and 100, got {score}"
                )));
            }
        }
        if self.max_concurrent_searches == 0 || self.max_concurrent_model_calls == 0 {
            return Err(Error::config(
                "discovery concurrency limits must be greater than 0".to_string(),
            ));
        }
        if self.retry.min_suggested_delay_ms > self.retry.max_suggested_delay_ms {
            return Err(Error::config(
                "retry.min_suggested_delay_ms must not exceed retry.max_suggested_delay_ms"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
