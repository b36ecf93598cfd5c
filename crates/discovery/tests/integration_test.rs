//! Integration tests for the discovery flows

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tablescout_core::search_models::*;
use tablescout_core::{error::Result as CoreResult, CompletionModel, Config, ModelError, SearchBackend};
use tablescout_discovery::{
    DiscoveryError, DiscoveryOrchestrator, DiscoveryRequest, QuerySource, TargetColumn,
};
use tokio_util::sync::CancellationToken;

/// Search backend serving canned tables per query
struct MockSearchBackend {
    tables_by_query: HashMap<String, Vec<String>>,
    default_tables: Vec<String>,
    failing_queries: Vec<String>,
    cancel_after: Option<(usize, CancellationToken)>,
    calls: Mutex<Vec<String>>,
}

impl MockSearchBackend {
    fn new() -> Self {
        Self {
            tables_by_query: HashMap::new(),
            default_tables: Vec::new(),
            failing_queries: Vec::new(),
            cancel_after: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_tables(mut self, query: &str, tables: &[&str]) -> Self {
        self.tables_by_query.insert(
            query.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    fn with_default_tables(mut self, tables: &[&str]) -> Self {
        self.default_tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    fn with_failing_query(mut self, query: &str) -> Self {
        self.failing_queries.push(query.to_string());
        self
    }

    fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    fn queries_seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn hit(table: &str) -> SearchHit {
    SearchHit {
        metadata: TableMetadata {
            project_id: "acme".to_string(),
            dataset_id: "retail".to_string(),
            table_id: table.to_string(),
            description: Some(format!("The {table} table")),
            schema: vec![
                ColumnSchema {
                    name: format!("{table}_id"),
                    data_type: "STRING".to_string(),
                    description: None,
                    mode: None,
                },
                ColumnSchema {
                    name: "created_at".to_string(),
                    data_type: "TIMESTAMP".to_string(),
                    description: None,
                    mode: None,
                },
            ],
            row_count: Some(1_000),
            column_count: None,
            size_bytes: Some(65_536),
            has_pii: false,
            has_phi: false,
            extra: serde_json::Map::new(),
        },
        score: 0.8,
        snippet: format!("{table} snippet"),
        full_content: None,
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn search(&self, request: SearchRequest) -> CoreResult<SearchResponse> {
        let call_count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.query.clone());
            calls.len()
        };
        if let Some((after, token)) = &self.cancel_after {
            if call_count >= *after {
                token.cancel();
            }
        }

        if self.failing_queries.contains(&request.query) {
            return Err(tablescout_core::Error::search("backend unavailable"));
        }

        let tables = self
            .tables_by_query
            .get(&request.query)
            .unwrap_or(&self.default_tables);
        Ok(SearchResponse {
            results: tables.iter().map(|t| hit(t)).collect(),
            total_count: tables.len(),
        })
    }
}

type Responder = Box<dyn Fn(PromptKind, &str) -> Result<String, ModelError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Keywords,
    Plan,
    Fanout,
    Validation,
    Score,
}

/// Completion model that routes on the prompt template
struct MockModel {
    responder: Responder,
}

impl MockModel {
    fn new(
        responder: impl Fn(PromptKind, &str) -> Result<String, ModelError> + Send + Sync + 'static,
    ) -> Arc<dyn CompletionModel> {
        Arc::new(Self {
            responder: Box::new(responder),
        })
    }
}

fn classify(prompt: &str) -> PromptKind {
    if prompt.contains("data discovery assistant") {
        PromptKind::Keywords
    } else if prompt.contains("planning how to source a data product") {
        PromptKind::Plan
    } else if prompt.contains("broaden search queries") {
        PromptKind::Fanout
    } else if prompt.contains("validating whether a source table") {
        PromptKind::Validation
    } else {
        PromptKind::Score
    }
}

/// Value following `label` on its own line in the prompt
fn prompt_field<'a>(prompt: &'a str, label: &str) -> &'a str {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .unwrap_or("")
        .trim()
}

#[async_trait]
impl CompletionModel for MockModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        (self.responder)(classify(prompt), prompt)
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn orchestrator(
    model: Option<Arc<dyn CompletionModel>>,
    backend: Arc<MockSearchBackend>,
) -> DiscoveryOrchestrator {
    DiscoveryOrchestrator::new(&Config::default(), model, backend).unwrap()
}

const CHURN_PRP: &str = "# Subscriber Churn PRP

## Business Objective
Understand why premium subscribers cancel.

## Key Metrics
- **Monthly Churn Rate**: cancelled over active subscribers
- **Net Revenue Retention**
- **Average Tenure**: months since signup
";

fn target_schema() -> Vec<TargetColumn> {
    vec![
        TargetColumn {
            name: "store_id".to_string(),
            data_type: "STRING".to_string(),
            description: "Store key".to_string(),
        },
        TargetColumn {
            name: "net_sales".to_string(),
            data_type: "NUMERIC".to_string(),
            description: "Sales net of returns".to_string(),
        },
    ]
}

fn plan_json(steps: usize) -> String {
    let steps: Vec<serde_json::Value> = (1..=steps)
        .map(|i| {
            serde_json::json!({
                "conceptual_group": format!("Group {i}"),
                "search_query": format!("query {i}"),
                "target_columns": [{"name": "store_id", "type": "STRING", "description": "Store key"}]
            })
        })
        .collect();
    serde_json::json!({ "search_plan": steps }).to_string()
}

#[tokio::test]
async fn test_disabled_model_falls_back_to_bold_key_metrics() {
    let backend = Arc::new(MockSearchBackend::new().with_default_tables(&["subscriptions"]));
    let response = orchestrator(None, backend.clone())
        .discover(DiscoveryRequest::new(CHURN_PRP))
        .await
        .unwrap();

    let planned: Vec<String> = backend.queries_seen().into_iter().take(3).collect();
    assert_eq!(
        planned,
        vec![
            "monthly churn rate".to_string(),
            "net revenue retention".to_string(),
            "average tenure".to_string(),
        ]
    );

    let metadata = &response.discovery_metadata;
    assert_eq!(metadata.query_source, QuerySource::Fallback);
    assert_eq!(metadata.queries_generated, 3);
    assert!(!metadata.refinements.is_empty());

    // One table found by every query, so fan-out is attempted but the
    // disabled model yields no fan-out queries.
    assert!(metadata.fanout_triggered);
    assert_eq!(metadata.fanout_queries_count, 0);
    assert_eq!(response.total_count, 1);
    assert_eq!(response.datasets[0].relevance_score, Some(70.0));
}

#[tokio::test]
async fn test_same_table_from_two_queries_is_deduplicated() {
    let model = MockModel::new(|kind, _| match kind {
        PromptKind::Keywords => Ok("1. daily store sales\n2. store revenue by region".to_string()),
        PromptKind::Score => Ok("80".to_string()),
        _ => Ok("[]".to_string()),
    });
    let backend = Arc::new(
        MockSearchBackend::new()
            .with_tables("daily store sales", &["sales", "stores", "calendar"])
            .with_tables("store revenue by region", &["sales", "regions"]),
    );

    let response = orchestrator(Some(model), backend)
        .discover(DiscoveryRequest::new(CHURN_PRP))
        .await
        .unwrap();

    let metadata = &response.discovery_metadata;
    assert_eq!(metadata.query_source, QuerySource::Model);
    assert_eq!(metadata.total_candidates_found, 5);
    assert_eq!(metadata.candidates_after_dedup, 4);
    assert!(!metadata.fanout_triggered);

    let sales = response
        .datasets
        .iter()
        .find(|c| c.table_id == "acme.retail.sales")
        .unwrap();
    assert_eq!(
        sales.matched_queries,
        vec![
            "daily store sales".to_string(),
            "store revenue by region".to_string()
        ]
    );
}

#[tokio::test]
async fn test_fanout_adds_candidates_without_removing_any() {
    let model = MockModel::new(|kind, _| match kind {
        PromptKind::Keywords => Ok("1. premium churn events".to_string()),
        PromptKind::Fanout => {
            Ok("```json\n[\"subscription lifecycle events\", \"billing plan history\"]\n```".to_string())
        }
        PromptKind::Score => Ok("90".to_string()),
        _ => Ok(String::new()),
    });
    let backend = Arc::new(
        MockSearchBackend::new()
            .with_tables("premium churn events", &["churn"])
            .with_tables("subscription lifecycle events", &["subscriptions", "churn"])
            .with_tables("billing plan history", &["billing"]),
    );

    let response = orchestrator(Some(model), backend.clone())
        .discover(DiscoveryRequest::new(CHURN_PRP))
        .await
        .unwrap();

    let metadata = &response.discovery_metadata;
    assert!(metadata.fanout_triggered);
    assert_eq!(metadata.fanout_queries_count, 2);
    assert_eq!(metadata.candidates_after_dedup, 3);
    assert_eq!(metadata.query_executions.len(), 3);
    assert_eq!(
        metadata
            .refinements
            .iter()
            .filter(|r| r.reason.starts_with("fan-out"))
            .count(),
        2
    );

    let ids: Vec<&str> = response.datasets.iter().map(|c| c.table_id.as_str()).collect();
    assert!(ids.contains(&"acme.retail.churn"));
    assert!(ids.contains(&"acme.retail.subscriptions"));
    assert!(ids.contains(&"acme.retail.billing"));

    let churn = response
        .datasets
        .iter()
        .find(|c| c.table_id == "acme.retail.churn")
        .unwrap();
    assert_eq!(churn.matched_queries[0], "premium churn events");
}

#[tokio::test]
async fn test_fanout_not_triggered_at_threshold() {
    let model = MockModel::new(|kind, _| match kind {
        PromptKind::Keywords => Ok("1. premium churn events".to_string()),
        PromptKind::Fanout => panic!("fan-out should not run"),
        _ => Ok("75".to_string()),
    });
    let backend = Arc::new(
        MockSearchBackend::new().with_tables("premium churn events", &["a", "b", "c"]),
    );

    let response = orchestrator(Some(model), backend)
        .discover(DiscoveryRequest::new(CHURN_PRP))
        .await
        .unwrap();
    assert!(!response.discovery_metadata.fanout_triggered);
    assert_eq!(response.total_count, 3);
}

#[tokio::test]
async fn test_scores_are_bounded_and_filtered() {
    let model = MockModel::new(|kind, prompt| match kind {
        PromptKind::Keywords => Ok("1. subscriber tables".to_string()),
        PromptKind::Score => Ok(match prompt_field(prompt, "Table:") {
            "acme.retail.excellent" => "95\nCore churn data",
            "acme.retail.weak" => "Score: 40\nTangential",
            "acme.retail.overflow" => "150\nWay above the scale",
            _ => "I cannot say",
        }
        .to_string()),
        _ => Ok("[]".to_string()),
    });
    let backend = Arc::new(MockSearchBackend::new().with_default_tables(&[
        "weak",
        "overflow",
        "excellent",
        "unknown",
    ]));

    let response = orchestrator(Some(model), backend)
        .discover(DiscoveryRequest {
            min_relevance_score: Some(60.0),
            ..DiscoveryRequest::new(CHURN_PRP)
        })
        .await
        .unwrap();

    assert_eq!(response.total_count, 1);
    assert_eq!(response.datasets[0].table_id, "acme.retail.excellent");
    assert_eq!(response.datasets[0].relevance_score, Some(95.0));
    assert_eq!(response.discovery_metadata.candidates_after_scoring, 1);
    assert_eq!(response.discovery_metadata.candidates_after_dedup, 4);
}

#[tokio::test]
async fn test_ranking_and_max_results() {
    let model = MockModel::new(|kind, prompt| match kind {
        PromptKind::Keywords => Ok("1. subscriber tables".to_string()),
        PromptKind::Score => Ok(match prompt_field(prompt, "Table:") {
            "acme.retail.a" => "65",
            "acme.retail.b" => "99",
            _ => "80",
        }
        .to_string()),
        _ => Ok("[]".to_string()),
    });
    let backend = Arc::new(MockSearchBackend::new().with_default_tables(&["a", "b", "c"]));

    let response = orchestrator(Some(model), backend)
        .discover(DiscoveryRequest {
            max_results: Some(2),
            ..DiscoveryRequest::new(CHURN_PRP)
        })
        .await
        .unwrap();

    let ids: Vec<&str> = response.datasets.iter().map(|c| c.table_name.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
    assert_eq!(response.discovery_metadata.candidates_after_scoring, 3);
}

#[tokio::test]
async fn test_no_candidates_returns_empty_with_metadata() {
    let backend = Arc::new(MockSearchBackend::new().with_failing_query("monthly churn rate"));
    let response = orchestrator(None, backend)
        .discover(DiscoveryRequest::new(CHURN_PRP))
        .await
        .unwrap();

    assert_eq!(response.total_count, 0);
    assert!(response.datasets.is_empty());
    let metadata = &response.discovery_metadata;
    assert_eq!(metadata.queries_generated, 3);
    assert_eq!(metadata.queries_failed, 1);
    assert_eq!(metadata.queries_without_results, 2);
    assert_eq!(metadata.candidates_after_dedup, 0);
    assert!(metadata.fanout_triggered);
}

#[tokio::test]
async fn test_invalid_request_rejected() {
    let backend = Arc::new(MockSearchBackend::new());
    let result = orchestrator(None, backend)
        .discover(DiscoveryRequest::new(""))
        .await;
    assert!(matches!(result, Err(DiscoveryError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_validator_error_fails_closed() {
    let model = MockModel::new(|kind, _| match kind {
        PromptKind::Plan => Ok(plan_json(1)),
        PromptKind::Validation => Err(ModelError::other("upstream exploded")),
        _ => Ok(String::new()),
    });
    let backend = Arc::new(MockSearchBackend::new().with_default_tables(&["stores", "sales"]));

    let results = orchestrator(Some(model), backend)
        .discover_with_plan(CHURN_PRP, &target_schema(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].discovered_tables.is_empty());
    assert!(results[0].error.is_none());
}

#[tokio::test]
async fn test_structured_plan_keeps_validated_tables() {
    let model = MockModel::new(|kind, prompt| match kind {
        PromptKind::Plan => Ok(format!("Here is the plan:\n{}", plan_json(2))),
        PromptKind::Validation => {
            let fits = prompt_field(prompt, "Source table:") == "acme.retail.stores";
            Ok(format!(r#"{{"is_good_fit": {fits}, "reasoning": "checked"}}"#))
        }
        _ => Ok(String::new()),
    });
    let backend = Arc::new(
        MockSearchBackend::new()
            .with_default_tables(&["stores", "sales"])
            .with_failing_query("query 2"),
    );

    let results = orchestrator(Some(model), backend)
        .discover_with_plan(CHURN_PRP, &target_schema(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].conceptual_group, "Group 1");
    assert_eq!(results[0].search_query, "query 1");
    assert_eq!(results[0].discovered_tables.len(), 1);
    assert_eq!(results[0].discovered_tables[0].table_id, "acme.retail.stores");

    assert!(results[1].discovered_tables.is_empty());
    assert!(results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("backend unavailable"));
}

#[tokio::test]
async fn test_cancellation_after_two_of_five_steps() {
    let token = CancellationToken::new();
    let model = MockModel::new(|kind, _| match kind {
        PromptKind::Plan => Ok(plan_json(5)),
        PromptKind::Validation => Ok(r#"{"is_good_fit": true, "reasoning": "ok"}"#.to_string()),
        _ => Ok(String::new()),
    });
    let backend = Arc::new(
        MockSearchBackend::new()
            .with_default_tables(&["stores"])
            .cancel_after(2, token.clone()),
    );

    let results = orchestrator(Some(model), backend.clone())
        .discover_with_plan(CHURN_PRP, &target_schema(), &token)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(backend.queries_seen(), vec!["query 1", "query 2"]);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.conceptual_group, format!("Group {}", i + 1));
        assert_eq!(result.discovered_tables.len(), 1);
        assert!(result.error.is_none());
    }
}

#[tokio::test]
async fn test_malformed_plan_is_fatal() {
    let model = MockModel::new(|kind, _| match kind {
        PromptKind::Plan => Ok("I would search for stores and sales.".to_string()),
        _ => Ok(String::new()),
    });
    let backend = Arc::new(MockSearchBackend::new());

    let result = orchestrator(Some(model), backend.clone())
        .discover_with_plan(CHURN_PRP, &target_schema(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(DiscoveryError::Plan(_))));
    assert!(backend.queries_seen().is_empty());
}

#[tokio::test]
async fn test_structured_plan_requires_model() {
    let backend = Arc::new(MockSearchBackend::new());
    let result = orchestrator(None, backend)
        .discover_with_plan(CHURN_PRP, &target_schema(), &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(DiscoveryError::ModelUnavailable)));
}
