//! Public API types for table discovery

use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};
use tablescout_core::search_models::{ColumnSchema, SearchHit};

/// Maximum PRP length to prevent excessive token consumption
const MAX_PRP_LENGTH: usize = 100_000;

/// Request for keyword-list discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub prp_text: String,
    /// Overrides `discovery.max_results`
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Overrides `discovery.min_relevance_score`
    #[serde(default)]
    pub min_relevance_score: Option<f64>,
}

impl DiscoveryRequest {
    pub fn new(prp_text: impl Into<String>) -> Self {
        Self {
            prp_text: prp_text.into(),
            max_results: None,
            min_relevance_score: None,
        }
    }

    /// Validate the request, checking PRP and option constraints
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.prp_text.trim().is_empty() {
            return Err(DiscoveryError::InvalidRequest(
                "PRP text cannot be empty".to_string(),
            ));
        }
        if self.prp_text.chars().count() > MAX_PRP_LENGTH {
            return Err(DiscoveryError::InvalidRequest(format!(
                "PRP exceeds maximum length of {MAX_PRP_LENGTH} characters"
            )));
        }
        if let Some(score) = self.min_relevance_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(DiscoveryError::InvalidRequest(format!(
                    "min_relevance_score must be between 0 and 100, got {score}"
                )));
            }
        }
        Ok(())
    }
}

/// Caller-facing result of the keyword-list flow
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResponse {
    pub total_count: usize,
    pub datasets: Vec<Candidate>,
    pub discovery_metadata: DiscoveryMetadata,
}

/// One column of the caller's target output schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub description: String,
}

/// One unit of planned search work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStep {
    pub conceptual_group: String,
    pub search_query: String,
    pub target_columns: Vec<TargetColumn>,
}

/// Ordered list of search steps; steps are independent of each other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchPlan {
    pub steps: Vec<SearchStep>,
}

/// Aggregated outcome of one structured-plan step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub conceptual_group: String,
    pub search_query: String,
    pub target_columns: Vec<TargetColumn>,
    pub discovered_tables: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    NoResults,
    Failed,
}

/// Record of a single query sent to the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExecution {
    pub query: String,
    pub results_count: usize,
    pub execution_time_ms: u64,
    /// Identities of the top-K tables this query returned
    pub top_tables: Vec<String>,
    pub status: QueryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Audit record of a fallback or fan-out query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRefinement {
    pub original_query: String,
    pub refined_query: String,
    pub reason: String,
}

impl QueryRefinement {
    pub fn new(
        original_query: impl Into<String>,
        refined_query: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            original_query: original_query.into(),
            refined_query: refined_query.into(),
            reason: reason.into(),
        }
    }
}

/// How the planner arrived at its queries
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The model produced the queries
    Planned(Vec<String>),
    /// A deterministic fallback produced the queries
    Fallback { queries: Vec<String>, reason: String },
    /// Nothing usable was produced at this stage
    Empty,
}

impl QueryResult {
    pub fn queries(&self) -> &[String] {
        match self {
            Self::Planned(queries) | Self::Fallback { queries, .. } => queries,
            Self::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queries().is_empty()
    }

    pub fn source(&self) -> QuerySource {
        match self {
            Self::Planned(_) => QuerySource::Model,
            Self::Fallback { .. } | Self::Empty => QuerySource::Fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    Model,
    Fallback,
}

/// Final keyword-mode planning outcome with its audit trail
#[derive(Debug, Clone)]
pub struct GeneratedQueries {
    /// Never `QueryResult::Empty`
    pub result: QueryResult,
    pub refinements: Vec<QueryRefinement>,
}

impl GeneratedQueries {
    pub fn queries(&self) -> &[String] {
        self.result.queries()
    }
}

/// A discovered table, keyed by `project.dataset.table`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub table_id: String,
    pub project_id: String,
    pub dataset_id: String,
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Vec<ColumnSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub has_pii: bool,
    pub has_phi: bool,
    pub search_score: f32,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    /// Queries that returned this table, in the order they found it
    pub matched_queries: Vec<String>,
}

impl Candidate {
    /// Convert a search hit into the canonical candidate shape
    pub fn from_hit(hit: SearchHit, query: &str) -> Self {
        let metadata = hit.metadata;
        Self {
            table_id: metadata.identity(),
            column_count: metadata.column_count.or(match metadata.schema.len() {
                0 => None,
                n => u64::try_from(n).ok(),
            }),
            project_id: metadata.project_id,
            dataset_id: metadata.dataset_id,
            table_name: metadata.table_id,
            description: metadata.description,
            schema: metadata.schema,
            row_count: metadata.row_count,
            size_bytes: metadata.size_bytes,
            has_pii: metadata.has_pii,
            has_phi: metadata.has_phi,
            search_score: hit.score,
            snippet: hit.snippet,
            full_content: hit.full_content,
            relevance_score: None,
            matched_queries: vec![query.to_string()],
        }
    }

    pub fn identity(&self) -> &str {
        &self.table_id
    }

    /// Attach the relevance score, clamped to [0, 100]. Only the first call
    /// takes effect; returns false if a score was already attached.
    pub fn attach_relevance_score(&mut self, score: f64) -> bool {
        if self.relevance_score.is_some() {
            return false;
        }
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 100.0)
        };
        self.relevance_score = Some(score);
        true
    }

    /// Schema rendered one column per line for prompts
    pub fn schema_summary(&self) -> String {
        if self.schema.is_empty() {
            return "(schema unavailable)".to_string();
        }
        self.schema
            .iter()
            .map(|col| match &col.description {
                Some(desc) if !desc.is_empty() => {
                    format!("- {} ({}): {}", col.name, col.data_type, desc)
                }
                _ => format!("- {} ({})", col.name, col.data_type),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Observability record for one keyword-list discovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryMetadata {
    pub query_source: QuerySource,
    pub queries_generated: usize,
    pub queries_successful: usize,
    pub queries_without_results: usize,
    pub queries_failed: usize,
    /// Raw hits across every query, before deduplication
    pub total_candidates_found: usize,
    pub candidates_after_dedup: usize,
    pub candidates_after_scoring: usize,
    pub total_time_ms: u64,
    pub fanout_triggered: bool,
    pub fanout_queries_count: usize,
    pub query_executions: Vec<QueryExecution>,
    pub refinements: Vec<QueryRefinement>,
}
