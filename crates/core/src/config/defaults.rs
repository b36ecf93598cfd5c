//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_MODEL_PROVIDER: &str = "anthropic";
pub(crate) const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub(crate) const DEFAULT_SEARCH_PROVIDER: &str = "http";
pub(crate) const DEFAULT_SEARCH_BASE_URL: &str = "http://localhost:8080";

pub(crate) fn default_model_enabled() -> bool {
    true
}

pub(crate) fn default_model_provider() -> String {
    DEFAULT_MODEL_PROVIDER.to_string()
}

pub(crate) fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

pub(crate) fn default_max_tokens() -> u32 {
    4096
}

pub(crate) fn default_temperature() -> f32 {
    0.0
}

pub(crate) fn default_search_provider() -> String {
    DEFAULT_SEARCH_PROVIDER.to_string()
}

pub(crate) fn default_search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.to_string()
}

pub(crate) fn default_page_size() -> usize {
    10
}

pub(crate) fn default_search_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_max_concurrent_requests() -> usize {
    8
}

pub(crate) fn default_max_queries() -> usize {
    5
}

pub(crate) fn default_top_k_per_query() -> usize {
    5
}

pub(crate) fn default_min_candidates_before_fanout() -> usize {
    3
}

pub(crate) fn default_fanout_query_count() -> usize {
    3
}

pub(crate) fn default_min_relevance_score() -> f64 {
    60.0
}

pub(crate) fn default_max_results() -> usize {
    10
}

pub(crate) fn default_disabled_model_score() -> f64 {
    70.0
}

pub(crate) fn default_max_concurrent_searches() -> usize {
    4
}

pub(crate) fn default_max_concurrent_model_calls() -> usize {
    4
}

pub(crate) fn default_max_retries() -> u32 {
    3
}

pub(crate) fn default_initial_delay_ms() -> u64 {
    1000
}

pub(crate) fn default_min_suggested_delay_ms() -> u64 {
    100
}

pub(crate) fn default_max_suggested_delay_ms() -> u64 {
    60_000
}
