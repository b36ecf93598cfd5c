//! Search backend providers for table discovery
//!
//! This crate provides concrete implementations of
//! [`tablescout_core::SearchBackend`] that talk to a table metadata index.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::sync::Arc;
use tablescout_core::config::SearchConfig;
use tablescout_core::error::{Error, Result};
use tablescout_core::SearchBackend;
use tracing::info;

pub mod error;
mod http;

pub use error::SearchClientError;
pub use http::HttpSearchBackend;

/// Create a new search backend based on configuration
///
/// # Arguments
/// * `config` - Search configuration including provider type
pub fn create_search_backend(config: &SearchConfig) -> Result<Arc<dyn SearchBackend>> {
    match config.provider.as_str() {
        "http" => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("TABLESCOUT_SEARCH_API_KEY").ok());

            info!("Creating HTTP search backend");
            let backend = HttpSearchBackend::new(
                config.base_url.clone(),
                api_key,
                config.timeout_secs,
                config.max_concurrent_requests,
            )?
            .with_full_content(config.include_full_content);

            Ok(Arc::new(backend))
        }
        other => Err(Error::config(format!(
            "Unknown search provider: '{other}'. Valid providers: http"
        ))),
    }
}
