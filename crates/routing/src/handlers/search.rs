//! Search interaction handlers.
//!
//! - `GET [base]/[type]?params` - type search
//! - `GET [base]?params` - system search

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use fhircloud_interface::{
    GlobalSearchRequest, Operation, SearchResult, SystemOperation, TypeSearchRequest,
};
use serde_json::Value;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{AccessToken, QueryParams, RequestContextExtractor, encode_query};
use crate::responses::{BundleBuilder, BundleEntry, BundleLink, fhir_json};
use crate::state::AppState;

/// Query parameter carrying the page offset.
pub const OFFSET_PARAM: &str = "_getpagesoffset";

/// Handler for type-level search.
pub async fn search_type_handler(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    token: AccessToken,
    context: RequestContextExtractor,
    params: QueryParams,
) -> RestResult<Response> {
    debug!(
        resource_type = %resource_type,
        params = params.0.len(),
        tenant = %context.tenant_id(),
        "Processing search request"
    );

    state
        .authorize(token.as_str(), Operation::SearchType, Some(&resource_type))
        .await?;
    let descriptor = state.resource_for(&resource_type, Operation::SearchType)?;

    let request = TypeSearchRequest {
        resource_type: resource_type.clone(),
        query_params: params.0.clone(),
        base_url: state.base_url().to_string(),
        tenant_id: context.tenant_id().to_string(),
    };
    let response = descriptor.type_search.type_search(&request).await?;

    let link_base = format!("{}/{}", state.base_url(), resource_type);
    let bundle = paged_bundle(
        BundleBuilder::searchset(),
        &response.result,
        &link_base,
        &params.0,
    );
    Ok(fhir_json(StatusCode::OK, bundle))
}

/// Handler for system-level search.
pub async fn search_system_handler(
    State(state): State<AppState>,
    token: AccessToken,
    context: RequestContextExtractor,
    params: QueryParams,
) -> RestResult<Response> {
    debug!(tenant = %context.tenant_id(), "Processing system search request");

    state
        .authorize(token.as_str(), Operation::SearchSystem, None)
        .await?;
    if !state.profile().supports(SystemOperation::SearchSystem) {
        return Err(RestError::MethodNotAllowed {
            operation: SystemOperation::SearchSystem.to_string(),
            target: "system".to_string(),
        });
    }

    let request = GlobalSearchRequest {
        query_params: params.0.clone(),
        base_url: state.base_url().to_string(),
        tenant_id: context.tenant_id().to_string(),
    };
    let response = state.profile().system_search.global_search(&request).await?;

    let bundle = paged_bundle(
        BundleBuilder::searchset(),
        &response.result,
        state.base_url(),
        &params.0,
    );
    Ok(fhir_json(StatusCode::OK, bundle))
}

/// Renders a result page with its total and `self`/`next`/`previous` links.
///
/// Paging links replace `_getpagesoffset` in the request parameters.
pub(crate) fn paged_bundle(
    builder: BundleBuilder,
    result: &SearchResult,
    link_base: &str,
    params: &[(String, String)],
) -> Value {
    let mut builder = builder
        .total(result.number_of_results)
        .add_link(BundleLink::new("self", page_url(link_base, params, None)));

    if result.has_more {
        let offset = result.first_result + result.page_size;
        builder = builder.add_link(BundleLink::new(
            "next",
            page_url(link_base, params, Some(offset)),
        ));
    }

    if result.first_result > 0 {
        let offset = result.first_result.saturating_sub(result.page_size);
        builder = builder.add_link(BundleLink::new(
            "previous",
            page_url(link_base, params, Some(offset)),
        ));
    }

    for entry in &result.entries {
        builder = builder.add_entry(BundleEntry::search_result(
            entry.resource.clone(),
            entry.full_url.clone(),
        ));
    }

    builder.build()
}

fn page_url(link_base: &str, params: &[(String, String)], offset: Option<usize>) -> String {
    let mut params = params.to_vec();
    if let Some(offset) = offset {
        params.retain(|(name, _)| name != OFFSET_PARAM);
        params.push((OFFSET_PARAM.to_string(), offset.to_string()));
    }

    if params.is_empty() {
        link_base.to_string()
    } else {
        format!("{}?{}", link_base, encode_query(&params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhircloud_interface::SearchEntry;
    use serde_json::json;

    fn page(first_result: usize, has_more: bool) -> SearchResult {
        SearchResult {
            number_of_results: 45,
            first_result,
            page_size: 20,
            entries: vec![SearchEntry {
                full_url: "https://fhir.test/Patient/p1".to_string(),
                resource: json!({ "resourceType": "Patient", "id": "p1" }),
            }],
            has_more,
        }
    }

    fn link<'a>(bundle: &'a Value, relation: &str) -> Option<&'a str> {
        bundle["link"]
            .as_array()?
            .iter()
            .find(|l| l["relation"] == relation)
            .and_then(|l| l["url"].as_str())
    }

    #[test]
    fn test_first_page_links() {
        let params = vec![("name".to_string(), "Jane".to_string())];
        let bundle = paged_bundle(
            BundleBuilder::searchset(),
            &page(0, true),
            "https://fhir.test/Patient",
            &params,
        );

        assert_eq!(bundle["type"], "searchset");
        assert_eq!(bundle["total"], 45);
        assert_eq!(link(&bundle, "self"), Some("https://fhir.test/Patient?name=Jane"));
        assert_eq!(
            link(&bundle, "next"),
            Some("https://fhir.test/Patient?name=Jane&_getpagesoffset=20")
        );
        assert_eq!(link(&bundle, "previous"), None);
        assert_eq!(bundle["entry"][0]["search"]["mode"], "match");
        assert_eq!(bundle["entry"][0]["fullUrl"], "https://fhir.test/Patient/p1");
    }

    #[test]
    fn test_last_page_links_replace_offset() {
        let params = vec![(OFFSET_PARAM.to_string(), "40".to_string())];
        let bundle = paged_bundle(
            BundleBuilder::searchset(),
            &page(40, false),
            "https://fhir.test/Patient",
            &params,
        );

        assert_eq!(link(&bundle, "next"), None);
        assert_eq!(
            link(&bundle, "previous"),
            Some("https://fhir.test/Patient?_getpagesoffset=20")
        );
    }

    #[test]
    fn test_self_link_without_params() {
        let bundle = paged_bundle(
            BundleBuilder::searchset(),
            &SearchResult::default(),
            "https://fhir.test",
            &[],
        );
        assert_eq!(link(&bundle, "self"), Some("https://fhir.test"));
        assert_eq!(bundle["entry"], json!([]));
    }
}
