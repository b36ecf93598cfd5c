//! Claude-backed completion model

use crate::error::{DiscoveryError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tablescout_core::{CompletionModel, ModelConfig, ModelError};
use tracing::info;

/// [`CompletionModel`] over the Anthropic messages API
pub struct ClaudeCompletionModel {
    client: Arc<claudius::Anthropic>,
    model: claudius::Model,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for ClaudeCompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeCompletionModel")
            .field("client", &"<Anthropic>")
            .field("model", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ClaudeCompletionModel {
    pub fn new(api_key: String, config: &ModelConfig) -> Result<Self> {
        let client = claudius::Anthropic::new(Some(api_key))
            .map_err(|e| DiscoveryError::Config(format!("Failed to create Anthropic client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            model: claudius::Model::Custom(config.model.clone()),
            model_name: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionModel for ClaudeCompletionModel {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ModelError> {
        let mut params = claudius::MessageCreateParams::simple(
            claudius::MessageParam::user(prompt.to_string()),
            self.model.clone(),
        );
        params.max_tokens = self.max_tokens;
        params.temperature = Some(self.temperature);

        let response = self
            .client
            .send(params)
            .await
            .map_err(|e| ModelError::from_message(e.to_string()))?;

        Ok(response
            .content
            .iter()
            .filter_map(|block| match block {
                claudius::ContentBlock::Text(text_block) => Some(text_block.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Build the configured completion model.
///
/// Returns `Ok(None)` when the model is disabled, which puts every component
/// on its deterministic fallback.
pub fn create_completion_model(config: &ModelConfig) -> Result<Option<Arc<dyn CompletionModel>>> {
    if !config.enabled {
        info!("Completion model disabled by configuration");
        return Ok(None);
    }

    match config.provider.as_str() {
        "anthropic" => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                DiscoveryError::Config(
                    "Anthropic API key not configured (set model.api_key or ANTHROPIC_API_KEY)"
                        .to_string(),
                )
            })?;
            info!("Using Anthropic model {}", config.model);
            Ok(Some(Arc::new(ClaudeCompletionModel::new(api_key, config)?)))
        }
        other => Err(DiscoveryError::Config(format!(
            "Unknown model provider: {other}"
        ))),
    }
}
