//! Search contract and the static filter model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FhirResult;
use crate::fhir_version::FhirVersion;

/// Function that strips internal bookkeeping fields from a stored item.
pub type ItemCleaner = fn(Value) -> Value;

/// How a filter compares the stored field against its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    /// The field equals one of the values.
    #[serde(rename = "==")]
    Eq,
    /// The field equals none of the values.
    #[serde(rename = "!=")]
    NotEq,
}

/// How a filter combines with the other filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    /// Every AND filter must match.
    And,
    /// At least one OR filter must match.
    Or,
}

/// A filter applied to every search, independent of the query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// The stored field name.
    pub key: String,
    /// Accepted (or rejected) values.
    pub value: Vec<String>,
    /// The comparison to apply.
    pub comparison_operator: ComparisonOperator,
    /// How the filter combines with the others.
    pub logical_operator: LogicalOperator,
}

impl SearchFilter {
    /// Creates an `==` / `AND` filter.
    pub fn must_equal(key: impl Into<String>, values: &[&str]) -> Self {
        Self {
            key: key.into(),
            value: values.iter().map(|v| v.to_string()).collect(),
            comparison_operator: ComparisonOperator::Eq,
            logical_operator: LogicalOperator::And,
        }
    }
}

/// Request for a type-level search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSearchRequest {
    /// The FHIR resource type being searched.
    pub resource_type: String,
    /// Raw query parameters in request order (repeated keys allowed).
    pub query_params: Vec<(String, String)>,
    /// Base URL used to build `fullUrl` values.
    pub base_url: String,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// Request for a system-level search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSearchRequest {
    /// Raw query parameters in request order.
    pub query_params: Vec<(String, String)>,
    /// Base URL used to build `fullUrl` values.
    pub base_url: String,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// A single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    /// Absolute URL of the matched resource.
    pub full_url: String,
    /// The matched resource.
    pub resource: Value,
}

/// A page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Total number of matches across all pages.
    pub number_of_results: u64,
    /// Offset of the first entry on this page.
    pub first_result: usize,
    /// Page size used to produce this page.
    pub page_size: usize,
    /// Entries on this page.
    pub entries: Vec<SearchEntry>,
    /// Whether further pages exist.
    pub has_more: bool,
}

/// Response of a search call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The result page.
    pub result: SearchResult,
}

/// Search over stored resources.
#[async_trait]
pub trait Search: Send + Sync {
    /// Returns a short name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Searches a single resource type.
    async fn type_search(&self, request: &TypeSearchRequest) -> FhirResult<SearchResponse>;

    /// Searches across all resource types.
    async fn global_search(&self, request: &GlobalSearchRequest) -> FhirResult<SearchResponse>;

    /// Returns the FHIR version this implementation was configured for, if any.
    fn fhir_version(&self) -> Option<FhirVersion> {
        None
    }
}
