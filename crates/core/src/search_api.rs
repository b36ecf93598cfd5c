//! Search backend trait definition
//!
//! This trait defines the interface to the table index.
//! Implementations can be found in the search-client crate.

use crate::error::Result;
use async_trait::async_trait;

pub use super::search_models::*;

/// Trait defining search backend operations
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a full-text/semantic search over table metadata
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse>;
}
