//! Request and response models for search backend operations
//!
//! These types form the contract between the discovery core and the
//! full-text/semantic table index, and can be shared across components
//! without circular dependencies.

use serde::{Deserialize, Serialize};

/// Search request sent to the table index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub include_full_content: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, page_size: usize) -> Self {
        Self {
            query: query.into(),
            page_size,
            sort_order: None,
            include_full_content: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    LastModified,
}

/// One column of a table schema as reported by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Table metadata attached to a search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Vec<ColumnSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub has_pii: bool,
    #[serde(default)]
    pub has_phi: bool,
    /// Any additional fields the index returns, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TableMetadata {
    /// Fully-qualified identity: `project.dataset.table`
    pub fn identity(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// Single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub metadata: TableMetadata,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
}

/// Search response from the table index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_format() {
        let metadata = TableMetadata {
            project_id: "acme-prod".to_string(),
            dataset_id: "sales".to_string(),
            table_id: "orders".to_string(),
            description: None,
            schema: vec![],
            row_count: None,
            column_count: None,
            size_bytes: None,
            has_pii: false,
            has_phi: false,
            extra: serde_json::Map::new(),
        };
        assert_eq!(metadata.identity(), "acme-prod.sales.orders");
    }

    #[test]
    fn test_search_response_parsing_preserves_extra_fields() {
        let json = r#"{
            "results": [{
                "metadata": {
                    "project_id": "p",
                    "dataset_id": "d",
                    "table_id": "t",
                    "schema": [{"name": "order_id", "type": "STRING"}],
                    "row_count": 1200,
                    "has_pii": true,
                    "owner": "data-eng"
                },
                "score": 0.87,
                "snippet": "orders table"
            }],
            "total_count": 1
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let hit = &response.results[0];
        assert_eq!(hit.metadata.schema[0].data_type, "STRING");
        assert_eq!(hit.metadata.row_count, Some(1200));
        assert!(hit.metadata.has_pii);
        assert!(!hit.metadata.has_phi);
        assert_eq!(
            hit.metadata.extra.get("owner").and_then(|v| v.as_str()),
            Some("data-eng")
        );
    }

    #[test]
    fn test_request_omits_unset_sort_order() {
        let request = SearchRequest::new("monthly revenue", 10);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("sort_order").is_none());
        assert_eq!(json["page_size"], 10);
        assert_eq!(json["include_full_content"], false);
    }
}
