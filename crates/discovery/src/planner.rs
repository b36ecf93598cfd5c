//! Query planning: PRP to keyword queries or to a structured search plan

use crate::{
    error::{truncate_for_error, DiscoveryError, Result},
    json::extract_json,
    keywords,
    model_caller::ModelCaller,
    prompts,
    prp::{strip_emphasis, Prp},
    types::{GeneratedQueries, QueryRefinement, QueryResult, SearchPlan, TargetColumn},
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{info, warn};

const MIN_QUERY_CHARS: usize = 5;
const META_PHRASES: &[&str] = &["search queries", "query:"];
const MODEL_STAGE: &str = "model query planning";

static NUMBERED_LINE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s*(.+)$").ok());

/// JSON envelope the structured-plan prompt asks for
#[derive(Debug, Deserialize)]
struct PlanEnvelope {
    search_plan: SearchPlan,
}

pub(crate) struct QueryPlanner {
    caller: ModelCaller,
    max_queries: usize,
}

impl QueryPlanner {
    pub(crate) fn new(caller: ModelCaller, max_queries: usize) -> Self {
        Self {
            caller,
            max_queries,
        }
    }

    /// Plan keyword queries for a PRP.
    ///
    /// Always yields between 1 and `max_queries` queries: model output when
    /// usable, else bullet keywords, else capitalized phrases, else a default.
    pub(crate) async fn generate_queries(&self, prp: &Prp<'_>) -> GeneratedQueries {
        let mut reason = match self.model_queries(prp).await {
            Ok(queries) => {
                info!("Model planned {} queries", queries.len());
                return GeneratedQueries {
                    result: QueryResult::Planned(queries),
                    refinements: Vec::new(),
                };
            }
            Err(reason) => reason.to_string(),
        };

        let mut refinements = Vec::new();
        let mut failed_stage = MODEL_STAGE;

        let stages = [
            (
                "bullet keyword extraction",
                keywords::bullet_terms(prp, self.max_queries),
                "no bulleted terms in planning sections",
            ),
            (
                "capitalized term extraction",
                keywords::capitalized_terms(prp.text(), self.max_queries),
                "no capitalized phrases in PRP",
            ),
        ];

        for (stage, queries, empty_reason) in stages {
            let transition = format!("{reason}; falling back to {stage}");
            refinements.push(QueryRefinement::new(
                failed_stage,
                queries.join("; "),
                transition.clone(),
            ));
            let result = fallback_result(queries, transition);
            if !result.is_empty() {
                warn!("Using fallback queries from {stage}: {:?}", result.queries());
                return GeneratedQueries {
                    result,
                    refinements,
                };
            }
            failed_stage = stage;
            reason = empty_reason.to_string();
        }

        let transition = format!("{reason}; falling back to default query");
        refinements.push(QueryRefinement::new(
            failed_stage,
            keywords::DEFAULT_QUERY,
            transition.clone(),
        ));
        warn!("No terms extracted from PRP, using default query");
        GeneratedQueries {
            result: QueryResult::Fallback {
                queries: vec![keywords::DEFAULT_QUERY.to_string()],
                reason: transition,
            },
            refinements,
        }
    }

    async fn model_queries(&self, prp: &Prp<'_>) -> std::result::Result<Vec<String>, &'static str> {
        if !self.caller.is_enabled() {
            return Err("completion model disabled");
        }

        let max_queries = self.max_queries.to_string();
        let prompt = prompts::format_prompt(
            prompts::KEYWORD_QUERIES,
            &[
                ("max_queries", &max_queries),
                ("prp", &prp.planning_context()),
            ],
        );

        let Some(response) = self.caller.call(&prompt, "query_planner").await else {
            return Err("model returned no response");
        };

        let queries = parse_numbered_queries(&response, self.max_queries);
        if queries.is_empty() {
            warn!(
                "No parseable queries in model response: {}",
                truncate_for_error(&response)
            );
            return Err("model response contained no parseable queries");
        }
        Ok(queries)
    }

    /// Ask the model for a structured search plan covering `target_schema`.
    ///
    /// There is no fallback: a disabled model, a missing response, or a plan
    /// that fails to parse or validate is returned as an error.
    pub(crate) async fn create_plan(
        &self,
        prp: &Prp<'_>,
        target_schema: &[TargetColumn],
    ) -> Result<SearchPlan> {
        if target_schema.is_empty() {
            return Err(DiscoveryError::InvalidRequest(
                "target schema must contain at least one column".to_string(),
            ));
        }
        if !self.caller.is_enabled() {
            return Err(DiscoveryError::ModelUnavailable);
        }

        let schema_json = serde_json::to_string_pretty(target_schema)?;
        let prompt = prompts::format_prompt(
            prompts::SEARCH_PLAN,
            &[("prp", prp.text()), ("target_schema", &schema_json)],
        );

        let response = self
            .caller
            .call(&prompt, "search_plan")
            .await
            .ok_or_else(|| {
                DiscoveryError::Plan("model returned no response for search plan".to_string())
            })?;

        let plan = parse_search_plan(&response)?;
        info!("Search plan has {} steps", plan.steps.len());
        Ok(plan)
    }
}

fn fallback_result(queries: Vec<String>, reason: String) -> QueryResult {
    if queries.is_empty() {
        QueryResult::Empty
    } else {
        QueryResult::Fallback { queries, reason }
    }
}

/// Extract `<n>. <query>` lines, dropping short and meta lines
pub(crate) fn parse_numbered_queries(response: &str, max_queries: usize) -> Vec<String> {
    let Some(pattern) = NUMBERED_LINE_PATTERN.as_ref() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();

    response
        .lines()
        .filter_map(|line| pattern.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| strip_emphasis(m.as_str())))
        .filter(|query| query.chars().count() >= MIN_QUERY_CHARS)
        .filter(|query| {
            let lowered = query.to_lowercase();
            !META_PHRASES.iter().any(|phrase| lowered.contains(phrase))
        })
        .filter(|query| seen.insert(query.to_lowercase()))
        .take(max_queries)
        .collect()
}

pub(crate) fn parse_search_plan(response: &str) -> Result<SearchPlan> {
    let json = extract_json(response).ok_or_else(|| {
        DiscoveryError::Plan(format!(
            "no JSON found in model response: {}",
            truncate_for_error(response)
        ))
    })?;

    let envelope: PlanEnvelope = serde_json::from_str(json).map_err(|e| {
        DiscoveryError::Plan(format!(
            "response does not match search plan shape: {e}. Response: {}",
            truncate_for_error(json)
        ))
    })?;

    validate_plan(&envelope.search_plan)?;
    Ok(envelope.search_plan)
}

fn validate_plan(plan: &SearchPlan) -> Result<()> {
    if plan.steps.is_empty() {
        return Err(DiscoveryError::Plan("search plan has no steps".to_string()));
    }
    for (i, step) in plan.steps.iter().enumerate() {
        if step.conceptual_group.trim().is_empty() {
            return Err(DiscoveryError::Plan(format!(
                "step {i} has an empty conceptual_group"
            )));
        }
        if step.search_query.trim().is_empty() {
            return Err(DiscoveryError::Plan(format!(
                "step {i} ({}) has an empty search_query",
                step.conceptual_group
            )));
        }
        if step.target_columns.is_empty() {
            return Err(DiscoveryError::Plan(format!(
                "step {i} ({}) names no target columns",
                step.conceptual_group
            )));
        }
        if step.target_columns.iter().any(|c| c.name.trim().is_empty()) {
            return Err(DiscoveryError::Plan(format!(
                "step {i} ({}) has a target column without a name",
                step.conceptual_group
            )));
        }
    }
    Ok(())
}
