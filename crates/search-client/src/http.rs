//! HTTP search backend provider

use crate::error::SearchClientError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tablescout_core::error::Result;
use tablescout_core::search_api::{SearchRequest, SearchResponse};
use tablescout_core::SearchBackend;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Search backend reached over HTTP at `{base_url}/search`
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    include_full_content: bool,
    concurrency_limiter: Arc<Semaphore>,
}

impl std::fmt::Debug for HttpSearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("include_full_content", &self.include_full_content)
            .finish()
    }
}

impl HttpSearchBackend {
    /// Create a new HTTP search backend
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the search service (e.g., "http://localhost:8080")
    /// * `api_key` - Optional bearer token
    /// * `timeout_secs` - Request timeout in seconds
    /// * `max_concurrent_requests` - Maximum concurrent API requests
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout_secs: u64,
        max_concurrent_requests: usize,
    ) -> Result<Self> {
        info!("Initializing HTTP search backend");
        info!("  Base URL: {base_url}");
        info!("  Timeout: {timeout_secs}s");
        info!("  Max concurrent requests: {max_concurrent_requests}");

        if max_concurrent_requests == 0 {
            return Err(SearchClientError::ConfigError(
                "max_concurrent_requests must be greater than 0".to_string(),
            )
            .into());
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                SearchClientError::ConfigError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            include_full_content: false,
            concurrency_limiter: Arc::new(Semaphore::new(max_concurrent_requests)),
        })
    }

    /// Request full table content on every search unless the caller already asked for it
    pub fn with_full_content(mut self, include_full_content: bool) -> Self {
        self.include_full_content = include_full_content;
        self
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, mut request: SearchRequest) -> Result<SearchResponse> {
        request.include_full_content |= self.include_full_content;

        let search_url = format!("{}/search", self.base_url);
        debug!(
            "Sending search request: query='{}' page_size={}",
            request.query, request.page_size
        );

        // Acquire semaphore permit for concurrency control
        let _permit = self.concurrency_limiter.acquire().await.map_err(|e| {
            SearchClientError::RequestError(format!("Failed to acquire concurrency permit: {e}"))
        })?;

        let mut builder = self.client.post(&search_url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SearchClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(SearchClientError::StatusError { status, body }.into());
        }

        let search_response: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchClientError::DecodeError(e.to_string()))?;

        debug!(
            "Search for '{}' returned {} results (total_count={})",
            request.query,
            search_response.results.len(),
            search_response.total_count
        );

        Ok(search_response)
    }
}
