//! Type search against a local HTTP endpoint standing in for the cluster.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use fhircloud_interface::{FhirError, FhirVersion, Search, SearchFilter, TypeSearchRequest};
use fhircloud_search::{ElasticSearchService, build_client};
use serde_json::{Value, json};
use tokio::net::TcpListener;

type SeenIndices = Arc<Mutex<Vec<String>>>;

async fn search(State(seen): State<SeenIndices>, Path(index): Path<String>) -> Response {
    seen.lock().unwrap().push(index.clone());

    let product = (HeaderName::from_static("x-elastic-product"), "Elasticsearch");
    let (status, body) = if index.starts_with("patient") {
        (
            StatusCode::NOT_FOUND,
            json!({
                "error": {
                    "type": "index_not_found_exception",
                    "reason": format!("no such index [{index}]")
                },
                "status": 404
            }),
        )
    } else if index.starts_with("observation") {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": { "type": "search_phase_execution_exception" }, "status": 500 }),
        )
    } else {
        (
            StatusCode::OK,
            json!({
                "hits": {
                    "total": { "value": 1, "relation": "eq" },
                    "hits": [{
                        "_source": {
                            "resourceType": "Encounter",
                            "id": "e1",
                            "documentStatus": "AVAILABLE"
                        }
                    }]
                }
            }),
        )
    };

    (status, [product], axum::Json(body)).into_response()
}

async fn start_cluster() -> (String, SeenIndices) {
    let seen = SeenIndices::default();
    let app = Router::new()
        .route("/{index}/_search", any(search))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

fn strip_status(mut item: Value) -> Value {
    if let Some(map) = item.as_object_mut() {
        map.remove("documentStatus");
    }
    item
}

fn service(endpoint: &str) -> ElasticSearchService {
    ElasticSearchService::new(
        build_client(endpoint).unwrap(),
        vec![SearchFilter::must_equal("documentStatus", &["AVAILABLE"])],
        strip_status,
        FhirVersion::R4,
    )
}

fn request(resource_type: &str, tenant_id: &str) -> TypeSearchRequest {
    TypeSearchRequest {
        resource_type: resource_type.to_string(),
        query_params: vec![("_count".to_string(), "5".to_string())],
        base_url: "https://fhir.test".to_string(),
        tenant_id: tenant_id.to_string(),
    }
}

#[tokio::test]
async fn test_missing_index_returns_empty_result() {
    let (endpoint, seen) = start_cluster().await;

    let response = service(&endpoint)
        .type_search(&request("Patient", "-abc"))
        .await
        .unwrap();

    assert_eq!(response.result.number_of_results, 0);
    assert!(response.result.entries.is_empty());
    assert!(!response.result.has_more);
    assert_eq!(response.result.page_size, 5);
    assert_eq!(seen.lock().unwrap().as_slice(), ["patient-abc".to_string()]);
}

#[tokio::test]
async fn test_failed_search_is_backend_error() {
    let (endpoint, _) = start_cluster().await;

    let err = service(&endpoint)
        .type_search(&request("Observation", ""))
        .await
        .unwrap_err();

    assert!(matches!(err, FhirError::Backend { service, .. } if service == "elasticsearch"));
}

#[tokio::test]
async fn test_hits_become_cleaned_entries() {
    let (endpoint, seen) = start_cluster().await;

    let response = service(&endpoint)
        .type_search(&request("Encounter", ""))
        .await
        .unwrap();

    assert_eq!(response.result.number_of_results, 1);
    let entry = &response.result.entries[0];
    assert_eq!(entry.full_url, "https://fhir.test/Encounter/e1");
    assert!(entry.resource.get("documentStatus").is_none());
    assert_eq!(seen.lock().unwrap().as_slice(), ["encounter".to_string()]);
}
