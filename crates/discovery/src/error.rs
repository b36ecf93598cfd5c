//! Error types for discovery operations
//!
//! Only fatal paths surface here. Degraded model or search behaviour is
//! absorbed by the components and recorded in run metadata instead.

use thiserror::Error;

const MAX_ERROR_CONTEXT_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Completion model is disabled or not configured")]
    ModelUnavailable,

    #[error("Search plan error: {0}")]
    Plan(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] tablescout_core::Error),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Truncate model output for inclusion in error and log messages
pub(crate) fn truncate_for_error(text: &str) -> String {
    truncate_chars(text, MAX_ERROR_CONTEXT_CHARS)
}

/// Truncate to at most `max_chars` characters, appending "..." when cut
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
