//! Rate-limit aware wrapper around the completion model
//!
//! Every model-backed component goes through [`ModelCaller::call`]. It retries
//! rate-limited calls with backoff and turns every other failure into `None`,
//! so callers only ever decide between "got text" and "use the fallback".

use std::sync::Arc;
use std::time::Duration;
use tablescout_core::{CompletionModel, ModelError, RetryConfig};
use tracing::{debug, warn};

#[derive(Clone)]
pub(crate) struct ModelCaller {
    model: Option<Arc<dyn CompletionModel>>,
    retry: RetryConfig,
}

impl ModelCaller {
    pub(crate) fn new(model: Option<Arc<dyn CompletionModel>>, retry: RetryConfig) -> Self {
        Self { model, retry }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Call the model, retrying rate limits up to `max_retries` times.
    ///
    /// Returns `None` when the model is disabled, on any non-retryable error,
    /// or once retries are exhausted.
    pub(crate) async fn call(&self, prompt: &str, label: &str) -> Option<String> {
        let model = self.model.as_ref()?;
        let max_retries = self.retry.max_retries;
        let mut attempt: u32 = 0;

        loop {
            debug!(
                "[{label}] prompt to {} (attempt {}):\n{prompt}",
                model.model_name(),
                attempt + 1
            );

            match model.complete(prompt).await {
                Ok(text) => {
                    debug!("[{label}] response:\n{text}");
                    return Some(text);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let backoff = self.backoff_for(attempt, &e);
                    attempt += 1;
                    warn!("[{label}] model rate limited: {e}");
                    warn!("Retrying in {backoff:?} (attempt {attempt}/{max_retries})");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!("[{label}] model still rate limited after {max_retries} retries: {e}");
                    return None;
                }
                Err(e) => {
                    warn!("[{label}] model call failed: {e}");
                    return None;
                }
            }
        }
    }

    /// Provider hint when it falls inside the configured bounds, otherwise
    /// exponential backoff from the initial delay.
    fn backoff_for(&self, attempt: u32, error: &ModelError) -> Duration {
        let (min, max) = self.retry.suggested_delay_bounds();
        match error.suggested_delay {
            Some(hint) if hint >= min && hint <= max => hint,
            _ => self
                .retry
                .initial_delay()
                .saturating_mul(2u32.saturating_pow(attempt)),
        }
    }
}

impl std::fmt::Debug for ModelCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCaller")
            .field("model", &self.model.as_ref().map(|m| m.model_name()))
            .field("retry", &self.retry)
            .finish()
    }
}
