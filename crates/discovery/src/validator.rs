//! Schema validation: can a candidate table supply a step's target columns?

use crate::{
    error::truncate_for_error, json::extract_json, model_caller::ModelCaller, prompts,
    types::TargetColumn,
};
use serde::Deserialize;
use tablescout_core::search_models::ColumnSchema;
use tracing::{debug, warn};

/// Model verdict on one candidate. Both fields are required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaVerdict {
    pub is_good_fit: bool,
    pub reasoning: String,
}

impl SchemaVerdict {
    fn rejected(reasoning: impl Into<String>) -> Self {
        Self {
            is_good_fit: false,
            reasoning: reasoning.into(),
        }
    }
}

pub(crate) struct SchemaValidator {
    caller: ModelCaller,
}

impl SchemaValidator {
    pub(crate) fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    /// Judge conceptual fit. Any failure along the way rejects the candidate.
    pub(crate) async fn assess(
        &self,
        source_schema: &[ColumnSchema],
        target_columns: &[TargetColumn],
        conceptual_group: &str,
        source_table: &str,
    ) -> SchemaVerdict {
        let prompt = prompts::format_prompt(
            prompts::SCHEMA_VALIDATION,
            &[
                ("conceptual_group", conceptual_group),
                ("source_table", source_table),
                ("source_schema", &render_source_schema(source_schema)),
                ("target_columns", &render_target_columns(target_columns)),
            ],
        );

        let Some(response) = self.caller.call(&prompt, "schema_validation").await else {
            return SchemaVerdict::rejected("model unavailable or call failed");
        };

        let verdict = parse_verdict(&response);
        debug!(
            "Validation of {source_table} for '{conceptual_group}': fit={} ({})",
            verdict.is_good_fit, verdict.reasoning
        );
        verdict
    }

    pub(crate) async fn validate(
        &self,
        source_schema: &[ColumnSchema],
        target_columns: &[TargetColumn],
        conceptual_group: &str,
        source_table: &str,
    ) -> bool {
        self.assess(source_schema, target_columns, conceptual_group, source_table)
            .await
            .is_good_fit
    }
}

pub(crate) fn parse_verdict(response: &str) -> SchemaVerdict {
    let Some(json) = extract_json(response) else {
        warn!(
            "Schema validation response has no JSON: {}",
            truncate_for_error(response)
        );
        return SchemaVerdict::rejected("unparseable validation response");
    };

    match serde_json::from_str::<SchemaVerdict>(json) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!("Schema validation response has the wrong shape: {e}");
            SchemaVerdict::rejected(format!("invalid validation response: {e}"))
        }
    }
}

fn render_source_schema(schema: &[ColumnSchema]) -> String {
    if schema.is_empty() {
        return "(schema unavailable)".to_string();
    }
    schema
        .iter()
        .map(|col| match col.description.as_deref() {
            Some(desc) if !desc.is_empty() => format!("- {} ({}): {desc}", col.name, col.data_type),
            _ => format!("- {} ({})", col.name, col.data_type),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_target_columns(columns: &[TargetColumn]) -> String {
    columns
        .iter()
        .map(|col| {
            if col.description.is_empty() {
                format!("- {} ({})", col.name, col.data_type)
            } else {
                format!("- {} ({}): {}", col.name, col.data_type, col.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
