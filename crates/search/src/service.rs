use std::fmt;

use async_trait::async_trait;
use elasticsearch::{Elasticsearch, SearchParts};
use fhircloud_interface::{
    FhirError, FhirResult, FhirVersion, GlobalSearchRequest, ItemCleaner, Search, SearchEntry,
    SearchFilter, SearchResponse, SearchResult, TypeSearchRequest,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::SERVICE;
use crate::query_builder::{EsQuery, build_search_query};

/// Type-level search over one index per resource type.
pub struct ElasticSearchService {
    client: Elasticsearch,
    filters: Vec<SearchFilter>,
    cleaner: ItemCleaner,
    fhir_version: FhirVersion,
}

impl ElasticSearchService {
    pub fn new(
        client: Elasticsearch,
        filters: Vec<SearchFilter>,
        cleaner: ItemCleaner,
        fhir_version: FhirVersion,
    ) -> Self {
        Self {
            client,
            filters,
            cleaner,
            fhir_version,
        }
    }

    pub fn filters(&self) -> &[SearchFilter] {
        &self.filters
    }
}

impl fmt::Debug for ElasticSearchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticSearchService")
            .field("filters", &self.filters)
            .field("fhir_version", &self.fhir_version)
            .finish_non_exhaustive()
    }
}

/// Index holding one resource type for one tenant.
pub fn index_name(resource_type: &str, tenant_id: &str) -> String {
    format!("{}{}", resource_type.to_lowercase(), tenant_id)
}

/// Turns a search response body into a result page.
pub fn parse_search_response(
    body: &Value,
    query: &EsQuery,
    base_url: &str,
    resource_type: &str,
    cleaner: ItemCleaner,
) -> SearchResult {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .cloned()
        .unwrap_or_default();

    // `hits.total` is an object since Elasticsearch 7 and a number before.
    let total = body.get("hits").and_then(|h| h.get("total")).and_then(|t| {
        t.get("value").and_then(Value::as_u64).or_else(|| t.as_u64())
    });

    let base_url = base_url.trim_end_matches('/');
    let entries: Vec<SearchEntry> = hits
        .into_iter()
        .filter_map(|mut hit| hit.get_mut("_source").map(Value::take))
        .map(|source| {
            let resource = cleaner(source);
            let id = resource.get("id").and_then(Value::as_str).unwrap_or_default();
            SearchEntry {
                full_url: format!("{base_url}/{resource_type}/{id}"),
                resource,
            }
        })
        .collect();

    let total = total.unwrap_or((query.from + entries.len()) as u64);
    SearchResult {
        number_of_results: total,
        first_result: query.from,
        page_size: query.size,
        has_more: ((query.from + entries.len()) as u64) < total,
        entries,
    }
}

fn empty_result(query: &EsQuery) -> SearchResult {
    SearchResult {
        number_of_results: 0,
        first_result: query.from,
        page_size: query.size,
        entries: Vec::new(),
        has_more: false,
    }
}

#[async_trait]
impl Search for ElasticSearchService {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn type_search(&self, request: &TypeSearchRequest) -> FhirResult<SearchResponse> {
        let index = index_name(&request.resource_type, &request.tenant_id);
        let query = build_search_query(&self.filters, &request.query_params);
        debug!(index = %index, from = query.from, size = query.size, "Executing search");

        let response = self
            .client
            .search(SearchParts::Index(&[&index]))
            .body(query.body.clone())
            .send()
            .await
            .map_err(|e| FhirError::backend(SERVICE, e))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("index_not_found_exception") {
                debug!(index = %index, "Index does not exist, returning empty result");
                return Ok(SearchResponse {
                    result: empty_result(&query),
                });
            }
            warn!(index = %index, "Search failed");
            return Err(FhirError::backend(SERVICE, format!("search failed: {body}")));
        }

        let body: Value = response.json().await.map_err(|e| {
            FhirError::backend(SERVICE, format!("failed to parse search response: {e}"))
        })?;

        Ok(SearchResponse {
            result: parse_search_response(
                &body,
                &query,
                &request.base_url,
                &request.resource_type,
                self.cleaner,
            ),
        })
    }

    async fn global_search(&self, _request: &GlobalSearchRequest) -> FhirResult<SearchResponse> {
        Err(FhirError::NotImplemented("system search".to_string()))
    }

    fn fhir_version(&self) -> Option<FhirVersion> {
        Some(self.fhir_version)
    }
}
