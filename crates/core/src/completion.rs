//! Completion model abstraction
//!
//! Every LLM-backed component talks to the hosted model through
//! [`CompletionModel`]. Provider errors are classified once, here, into a
//! [`ModelError`] carrying a retryability kind and an optional server-suggested
//! delay, so callers never re-parse error strings.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

// Matches hints such as "Please retry in 12.5s" or "retry in 800 milliseconds"
static RETRY_HINT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)retry in\s+(\d+(?:\.\d+)?)\s*(ms|milliseconds?|s|secs?|seconds?)\b").ok()
});

/// Trait for hosted completion models
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a fully rendered prompt, returning the model's text output
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ModelError>;

    /// Model identifier, used for logging only
    fn model_name(&self) -> &str;
}

/// Classification of a completion failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// HTTP 429 or quota exhaustion; safe to retry after a delay
    RateLimited,
    /// Anything else; retrying will not help
    Other,
}

/// Error returned by [`CompletionModel::complete`]
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
    /// Delay suggested by the provider, if the error text carried one
    pub suggested_delay: Option<Duration>,
}

impl ModelError {
    /// Classify a provider error from its string representation.
    ///
    /// Text containing `429` or `quota` (any case) is a rate limit. A
    /// `retry in <n>(ms|s)` hint is extracted regardless of kind.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        let kind = if lowered.contains("429") || lowered.contains("quota") {
            ModelErrorKind::RateLimited
        } else {
            ModelErrorKind::Other
        };

        Self {
            kind,
            suggested_delay: parse_suggested_delay(&message),
            message,
        }
    }

    pub fn rate_limited(message: impl Into<String>, suggested_delay: Option<Duration>) -> Self {
        Self {
            kind: ModelErrorKind::RateLimited,
            message: message.into(),
            suggested_delay,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: ModelErrorKind::Other,
            message: message.into(),
            suggested_delay: None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ModelErrorKind::RateLimited
    }
}

/// Parse a `retry in N seconds|milliseconds` hint from error text
pub fn parse_suggested_delay(text: &str) -> Option<Duration> {
    let pattern = RETRY_HINT_PATTERN.as_ref()?;
    let caps = pattern.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();

    let secs = if unit.starts_with("ms") || unit.starts_with("milli") {
        value / 1000.0
    } else {
        value
    };

    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}
