//! Response building.

pub mod bundle;

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

pub use bundle::{BundleBuilder, BundleEntry, BundleLink, BundleType};

pub const FHIR_JSON: &str = "application/fhir+json";

/// Renders a FHIR resource with the FHIR JSON media type.
pub fn fhir_json(status: StatusCode, body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    response
}

/// Renders a resource, adding `ETag` and `Last-Modified` from its `meta`.
pub fn resource_response(status: StatusCode, resource: Value) -> Response {
    let version_id = resource["meta"]["versionId"].as_str().map(str::to_string);
    let last_updated = resource["meta"]["lastUpdated"]
        .as_str()
        .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&chrono::Utc).format("%a, %d %b %Y %H:%M:%S GMT").to_string());

    let mut response = fhir_json(status, resource);
    let headers = response.headers_mut();
    if let Some(vid) = version_id {
        insert_header(headers, header::ETAG, &format!("W/\"{}\"", vid));
    }
    if let Some(ts) = last_updated {
        insert_header(headers, header::LAST_MODIFIED, &ts);
    }
    response
}

fn insert_header(headers: &mut axum::http::HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}
