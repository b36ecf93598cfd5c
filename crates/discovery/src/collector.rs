//! Candidate collection: batch search, top-K truncation and dedup

use crate::types::{Candidate, QueryExecution, QueryStatus};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use tablescout_core::search_api::SearchRequest;
use tablescout_core::SearchBackend;
use tracing::{debug, info, warn};

/// Insertion-ordered candidates keyed by `project.dataset.table`.
///
/// The first sighting of a table wins; later sightings only extend its
/// `matched_queries` trail.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: IndexMap<String, Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn get(&self, identity: &str) -> Option<&Candidate> {
        self.entries.get(identity)
    }

    /// Insert unless a candidate with the same identity exists.
    /// Returns true if the candidate was inserted.
    pub fn insert_if_absent(&mut self, candidate: Candidate) -> bool {
        if self.entries.contains_key(candidate.identity()) {
            return false;
        }
        self.entries
            .insert(candidate.identity().to_string(), candidate);
        true
    }

    /// Note that `query` also found `identity`. Content is left untouched.
    /// Returns false if the identity is unknown.
    pub fn record_sighting(&mut self, identity: &str, query: &str) -> bool {
        match self.entries.get_mut(identity) {
            Some(existing) => {
                if !existing.matched_queries.iter().any(|q| q == query) {
                    existing.matched_queries.push(query.to_string());
                }
                true
            }
            None => false,
        }
    }

    /// Merge another set in order. Existing entries are never replaced.
    /// Returns the number of newly inserted candidates.
    pub fn merge(&mut self, other: CandidateSet) -> usize {
        let mut inserted = 0;
        for candidate in other.entries.into_values() {
            let identity = candidate.identity().to_string();
            let queries = candidate.matched_queries.clone();
            if self.insert_if_absent(candidate) {
                inserted += 1;
            } else {
                for query in &queries {
                    self.record_sighting(&identity, query);
                }
            }
        }
        inserted
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.values()
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.entries.into_values().collect()
    }
}

pub(crate) struct CandidateCollector {
    backend: Arc<dyn SearchBackend>,
    page_size: usize,
    top_k: usize,
    max_concurrent: usize,
}

impl CandidateCollector {
    pub(crate) fn new(
        backend: Arc<dyn SearchBackend>,
        page_size: usize,
        top_k: usize,
        max_concurrent: usize,
    ) -> Self {
        Self {
            backend,
            page_size,
            top_k,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run every query and merge their hits in query order.
    ///
    /// Queries run concurrently but a failed query only produces a `failed`
    /// execution record; siblings are unaffected.
    pub(crate) async fn search_for_candidates(
        &self,
        queries: &[String],
    ) -> (CandidateSet, Vec<QueryExecution>) {
        let outcomes: Vec<(QueryExecution, Vec<Candidate>)> =
            stream::iter(queries.iter().map(|query| self.search_one(query)))
                .buffered(self.max_concurrent)
                .collect()
                .await;

        let mut candidates = CandidateSet::new();
        let mut executions = Vec::with_capacity(outcomes.len());

        for (execution, found) in outcomes {
            for candidate in found {
                let identity = candidate.identity().to_string();
                if !candidates.insert_if_absent(candidate) {
                    candidates.record_sighting(&identity, &execution.query);
                }
            }
            executions.push(execution);
        }

        info!(
            "Collected {} unique candidates from {} queries",
            candidates.len(),
            executions.len()
        );
        (candidates, executions)
    }

    /// Execute a single query, returning its execution record and top-K hits
    pub(crate) async fn search_one(&self, query: &str) -> (QueryExecution, Vec<Candidate>) {
        let start = Instant::now();
        let result = self
            .backend
            .search(SearchRequest::new(query, self.page_size))
            .await;
        let execution_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                let results_count = response.results.len();
                let candidates: Vec<Candidate> = response
                    .results
                    .into_iter()
                    .take(self.top_k)
                    .map(|hit| Candidate::from_hit(hit, query))
                    .collect();
                let status = if candidates.is_empty() {
                    QueryStatus::NoResults
                } else {
                    QueryStatus::Success
                };
                debug!("Query '{query}' returned {results_count} results in {execution_time_ms}ms");

                let execution = QueryExecution {
                    query: query.to_string(),
                    results_count,
                    execution_time_ms,
                    top_tables: candidates.iter().map(|c| c.table_id.clone()).collect(),
                    status,
                    error_message: None,
                };
                (execution, candidates)
            }
            Err(e) => {
                warn!("Search failed for query '{query}': {e}");
                let execution = QueryExecution {
                    query: query.to_string(),
                    results_count: 0,
                    execution_time_ms,
                    top_tables: Vec::new(),
                    status: QueryStatus::Failed,
                    error_message: Some(e.to_string()),
                };
                (execution, Vec::new())
            }
        }
    }
}
