//! Discovery orchestrator: keyword-list flow and structured-plan flow

use crate::{
    collector::CandidateCollector,
    error::{DiscoveryError, Result},
    fanout::FanoutGenerator,
    model_caller::ModelCaller,
    planner::QueryPlanner,
    prp::Prp,
    scorer::RelevanceScorer,
    types::{
        Candidate, DiscoveryMetadata, DiscoveryRequest, DiscoveryResponse, QueryExecution,
        QueryRefinement, QuerySource, QueryStatus, SearchPlan, SearchStep, StepResult,
        TargetColumn,
    },
    validator::SchemaValidator,
};
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tablescout_core::{CompletionModel, Config, DiscoveryConfig, SearchBackend};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct DiscoveryOrchestrator {
    config: DiscoveryConfig,
    planner: QueryPlanner,
    fanout: FanoutGenerator,
    collector: CandidateCollector,
    validator: SchemaValidator,
    scorer: RelevanceScorer,
    model_enabled: bool,
}

impl std::fmt::Debug for DiscoveryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryOrchestrator")
            .field("config", &self.config)
            .field("model_enabled", &self.model_enabled)
            .finish()
    }
}

impl DiscoveryOrchestrator {
    /// Wire the components from configuration.
    ///
    /// `model` is ignored when `model.enabled` is false in `config`.
    pub fn new(
        config: &Config,
        model: Option<Arc<dyn CompletionModel>>,
        backend: Arc<dyn SearchBackend>,
    ) -> Result<Self> {
        config
            .discovery
            .validate()
            .map_err(|e| DiscoveryError::Config(e.to_string()))?;

        let model = model.filter(|_| config.model.enabled);
        let discovery = config.discovery.clone();
        let caller = ModelCaller::new(model, discovery.retry.clone());

        Ok(Self {
            planner: QueryPlanner::new(caller.clone(), discovery.max_queries),
            fanout: FanoutGenerator::new(caller.clone()),
            collector: CandidateCollector::new(
                backend,
                config.search.page_size,
                discovery.top_k_per_query,
                discovery.max_concurrent_searches,
            ),
            validator: SchemaValidator::new(caller.clone()),
            scorer: RelevanceScorer::new(
                caller.clone(),
                discovery.disabled_model_score,
                discovery.max_concurrent_model_calls,
            ),
            model_enabled: caller.is_enabled(),
            config: discovery,
        })
    }

    /// Keyword-list flow: plan, collect, escalate, score, filter and rank.
    ///
    /// Only an invalid request is an error. Degraded model or search
    /// behaviour shows up in the metadata instead.
    pub async fn discover(&self, request: DiscoveryRequest) -> Result<DiscoveryResponse> {
        request.validate()?;
        let start = Instant::now();
        let prp = Prp::new(&request.prp_text);
        let min_score = request
            .min_relevance_score
            .unwrap_or(self.config.min_relevance_score);
        let max_results = request.max_results.unwrap_or(self.config.max_results);

        info!("Planning search queries");
        let generated = self.planner.generate_queries(&prp).await;
        let query_source = generated.result.source();
        let queries = generated.queries().to_vec();
        let mut refinements = generated.refinements;

        info!("Collecting candidates for {} queries", queries.len());
        let (mut candidates, mut executions) =
            self.collector.search_for_candidates(&queries).await;

        let fanout_triggered = candidates.len() < self.config.min_candidates_before_fanout;
        let mut fanout_queries = Vec::new();
        if fanout_triggered {
            info!(
                "Only {} candidates (threshold {}), escalating to fan-out",
                candidates.len(),
                self.config.min_candidates_before_fanout
            );
            let summary = prp.summary();
            fanout_queries = self
                .fanout
                .generate_related_queries(&summary, self.config.fanout_query_count)
                .await;

            if fanout_queries.is_empty() {
                warn!("Fan-out produced no queries");
            } else {
                let reason = format!(
                    "fan-out: {} candidates found, below threshold of {}",
                    candidates.len(),
                    self.config.min_candidates_before_fanout
                );
                refinements.extend(
                    fanout_queries
                        .iter()
                        .map(|query| QueryRefinement::new(&summary, query, &reason)),
                );

                let (extra, extra_executions) =
                    self.collector.search_for_candidates(&fanout_queries).await;
                let added = candidates.merge(extra);
                info!("Fan-out added {added} new candidates");
                executions.extend(extra_executions);
            }
        }

        let counts = RunCounts {
            queries_generated: queries.len(),
            fanout_triggered,
            fanout_queries_count: fanout_queries.len(),
            candidates_after_dedup: candidates.len(),
        };

        if candidates.is_empty() {
            info!("No candidates found, returning empty result");
            let metadata = build_metadata(query_source, counts, 0, start, executions, refinements);
            return Ok(DiscoveryResponse {
                total_count: 0,
                datasets: Vec::new(),
                discovery_metadata: metadata,
            });
        }

        info!("Scoring {} candidates", candidates.len());
        let scored = self
            .scorer
            .score_all(&prp, candidates.into_candidates())
            .await;

        let mut ranked = filter_and_rank(scored, min_score);
        let after_scoring = ranked.len();
        ranked.truncate(max_results);
        info!(
            "{after_scoring} candidates at or above {min_score}, returning {}",
            ranked.len()
        );

        let metadata = build_metadata(
            query_source,
            counts,
            after_scoring,
            start,
            executions,
            refinements,
        );
        Ok(DiscoveryResponse {
            total_count: ranked.len(),
            datasets: ranked,
            discovery_metadata: metadata,
        })
    }

    /// Build a structured search plan. Fails if the model is unavailable or
    /// its output is not a valid plan.
    pub async fn create_plan(
        &self,
        prp_text: &str,
        target_schema: &[TargetColumn],
    ) -> Result<SearchPlan> {
        DiscoveryRequest::new(prp_text).validate()?;
        self.planner
            .create_plan(&Prp::new(prp_text), target_schema)
            .await
    }

    /// Structured-plan flow. Only the initial planning call can fail.
    pub async fn discover_with_plan(
        &self,
        prp_text: &str,
        target_schema: &[TargetColumn],
        cancel: &CancellationToken,
    ) -> Result<Vec<StepResult>> {
        let plan = self.create_plan(prp_text, target_schema).await?;
        Ok(self.execute_plan(&plan, cancel).await)
    }

    /// Run plan steps in order, stopping before the next step once `cancel`
    /// fires. Completed steps are always returned.
    pub async fn execute_plan(&self, plan: &SearchPlan, cancel: &CancellationToken) -> Vec<StepResult> {
        let total = plan.steps.len();
        let mut results = Vec::with_capacity(total);

        for (index, step) in plan.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Cancelled after {index} of {total} steps");
                break;
            }
            info!(
                "Step {}/{total}: '{}' -> '{}'",
                index + 1,
                step.conceptual_group,
                step.search_query
            );
            results.push(self.run_step(step).await);
        }

        results
    }

    async fn run_step(&self, step: &SearchStep) -> StepResult {
        let (execution, found) = self.collector.search_one(&step.search_query).await;

        if execution.status == QueryStatus::Failed {
            return StepResult {
                conceptual_group: step.conceptual_group.clone(),
                search_query: step.search_query.clone(),
                target_columns: step.target_columns.clone(),
                discovered_tables: Vec::new(),
                error: execution.error_message,
            };
        }

        let verdicts: Vec<(Candidate, bool)> = stream::iter(found.into_iter().map(|candidate| async move {
            let fits = self
                .validator
                .validate(
                    &candidate.schema,
                    &step.target_columns,
                    &step.conceptual_group,
                    candidate.identity(),
                )
                .await;
            (candidate, fits)
        }))
        .buffered(self.config.max_concurrent_model_calls.max(1))
        .collect()
        .await;

        let considered = verdicts.len();
        let discovered_tables: Vec<Candidate> = verdicts
            .into_iter()
            .filter_map(|(candidate, fits)| fits.then_some(candidate))
            .collect();
        info!(
            "'{}': {} of {considered} candidates validated",
            step.conceptual_group,
            discovered_tables.len()
        );

        StepResult {
            conceptual_group: step.conceptual_group.clone(),
            search_query: step.search_query.clone(),
            target_columns: step.target_columns.clone(),
            discovered_tables,
            error: None,
        }
    }
}

struct RunCounts {
    queries_generated: usize,
    fanout_triggered: bool,
    fanout_queries_count: usize,
    candidates_after_dedup: usize,
}

/// Keep candidates scoring at least `min_score`, highest first. Ties keep
/// discovery order.
fn filter_and_rank(candidates: Vec<Candidate>, min_score: f64) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.relevance_score.is_some_and(|score| score >= min_score))
        .collect();
    kept.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    kept
}

fn build_metadata(
    query_source: QuerySource,
    counts: RunCounts,
    candidates_after_scoring: usize,
    start: Instant,
    executions: Vec<QueryExecution>,
    refinements: Vec<QueryRefinement>,
) -> DiscoveryMetadata {
    let count_status = |status: QueryStatus| executions.iter().filter(|e| e.status == status).count();

    DiscoveryMetadata {
        query_source,
        queries_generated: counts.queries_generated,
        queries_successful: count_status(QueryStatus::Success),
        queries_without_results: count_status(QueryStatus::NoResults),
        queries_failed: count_status(QueryStatus::Failed),
        total_candidates_found: executions.iter().map(|e| e.top_tables.len()).sum(),
        candidates_after_dedup: counts.candidates_after_dedup,
        candidates_after_scoring,
        total_time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        fanout_triggered: counts.fanout_triggered,
        fanout_queries_count: counts.fanout_queries_count,
        query_executions: executions,
        refinements,
    }
}
