//! Fan-out generator: broader queries for sparse result sets

use crate::{
    error::truncate_for_error, json::strip_markdown_fences, model_caller::ModelCaller, prompts,
};
use tracing::{debug, warn};

pub(crate) struct FanoutGenerator {
    caller: ModelCaller,
}

impl FanoutGenerator {
    pub(crate) fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    /// Up to `num_queries` reinterpretations of `original_query`.
    ///
    /// An empty result means no escalation is possible; it is never an error.
    pub(crate) async fn generate_related_queries(
        &self,
        original_query: &str,
        num_queries: usize,
    ) -> Vec<String> {
        if num_queries == 0 || !self.caller.is_enabled() {
            debug!("Fan-out skipped (model disabled or zero queries requested)");
            return Vec::new();
        }

        let count = num_queries.to_string();
        let prompt = prompts::format_prompt(
            prompts::FANOUT,
            &[("num_queries", &count), ("query", original_query)],
        );

        let Some(response) = self.caller.call(&prompt, "fanout").await else {
            return Vec::new();
        };

        parse_query_array(&response, num_queries)
    }
}

pub(crate) fn parse_query_array(response: &str, num_queries: usize) -> Vec<String> {
    let body = strip_markdown_fences(response);
    match serde_json::from_str::<Vec<serde_json::Value>>(body) {
        Ok(values) => values
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .take(num_queries)
            .collect(),
        Err(e) => {
            warn!(
                "Fan-out response is not a JSON array ({e}): {}",
                truncate_for_error(response)
            );
            Vec::new()
        }
    }
}
