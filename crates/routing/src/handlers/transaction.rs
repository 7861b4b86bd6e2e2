//! Transaction interaction handler.
//!
//! `POST [base]` with a Bundle of type "transaction".

use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use fhircloud_interface::{
    AuthorizationBundleRequest, BatchReadWriteRequest, BatchReadWriteResponse, BundleRequest,
    Operation, SystemOperation,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{RestError, RestResult};
use crate::extractors::{AccessToken, RequestContextExtractor};
use crate::responses::bundle::EntryResponse;
use crate::responses::{BundleBuilder, BundleEntry, fhir_json};
use crate::state::AppState;

/// Maximum number of entries accepted in one transaction bundle.
pub const MAX_TRANSACTION_ENTRIES: usize = 25;

/// Stored in the object store, outside the transactional table.
const BINARY_RESOURCE_TYPE: &str = "Binary";

/// Handler for transaction bundles.
///
/// # Response
///
/// - `200 OK` - a `transaction-response` Bundle, one entry per request entry
/// - `400 Bad Request` - transactions are disabled, the body is not a
///   transaction Bundle, an entry is malformed, or there are too many entries
/// - `401 Unauthorized` - the token or any entry is denied
pub async fn transaction_handler(
    State(state): State<AppState>,
    token: AccessToken,
    context: RequestContextExtractor,
    body: Bytes,
) -> RestResult<Response> {
    debug!(tenant = %context.tenant_id(), "Processing transaction request");

    let claims = state
        .authorize(token.as_str(), Operation::Transaction, None)
        .await?;

    if !state.profile().supports(SystemOperation::Transaction) {
        return Err(RestError::BadRequest {
            message: "Server does not support transaction bundles".to_string(),
        });
    }

    let bundle: Value = serde_json::from_slice(&body).map_err(|e| RestError::BadRequest {
        message: format!("Invalid JSON body: {}", e),
    })?;
    let entries = parse_transaction(&bundle, state.base_url())?;

    for entry in &entries {
        state.resource(&entry.resource_type)?;
    }

    state
        .config()
        .auth
        .authorization
        .is_bundle_request_authorized(&AuthorizationBundleRequest {
            claims,
            requests: entries.clone(),
        })
        .await?;

    let request = BundleRequest {
        entries,
        tenant_id: context.tenant_id().to_string(),
    };
    let response = state.profile().bundle.transaction(&request).await?;
    if !response.success {
        warn!(message = %response.message, "Transaction was not applied");
        return Err(RestError::BadRequest {
            message: response.message,
        });
    }

    let mut builder = BundleBuilder::transaction_response();
    for result in response.responses {
        builder = builder.add_entry(response_entry(result));
    }

    Ok(fhir_json(StatusCode::OK, builder.build()))
}

/// Parses and validates the entries of a transaction Bundle.
pub(crate) fn parse_transaction(
    bundle: &Value,
    base_url: &str,
) -> RestResult<Vec<BatchReadWriteRequest>> {
    if bundle["resourceType"] != "Bundle" {
        return Err(RestError::BadRequest {
            message: "Request must be a Bundle resource".to_string(),
        });
    }
    if bundle["type"] != "transaction" {
        return Err(RestError::BadRequest {
            message: "Bundle type must be 'transaction'".to_string(),
        });
    }

    let entries = match bundle.get("entry") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(RestError::BadRequest {
                message: "Bundle.entry must be an array".to_string(),
            });
        }
    };

    if entries.len() > MAX_TRANSACTION_ENTRIES {
        return Err(RestError::BadRequest {
            message: format!(
                "Maximum number of entries for a Bundle is {}. There are currently {} entries in this Bundle",
                MAX_TRANSACTION_ENTRIES,
                entries.len()
            ),
        });
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry, base_url))
        .collect()
}

fn parse_entry(index: usize, entry: &Value, base_url: &str) -> RestResult<BatchReadWriteRequest> {
    let bad = |message: &str| RestError::BadRequest {
        message: format!("Bundle.entry[{}]: {}", index, message),
    };

    let method = entry["request"]["method"]
        .as_str()
        .ok_or_else(|| bad("request.method is required"))?;
    let url = entry["request"]["url"]
        .as_str()
        .ok_or_else(|| bad("request.url is required"))?;

    let operation = match method.to_ascii_uppercase().as_str() {
        "POST" => Operation::Create,
        "PUT" => Operation::Update,
        "DELETE" => Operation::Delete,
        "GET" => Operation::Read,
        other => return Err(bad(&format!("unsupported method {}", other))),
    };

    let path = url.strip_prefix(base_url).unwrap_or(url);
    let path = path.split('?').next().unwrap_or_default().trim_matches('/');
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let resource_type = segments
        .next()
        .ok_or_else(|| bad("request.url must name a resource type"))?
        .to_string();
    if resource_type == BINARY_RESOURCE_TYPE {
        return Err(bad("Binary resources are not supported in transactions"));
    }
    let id = segments.next().map(str::to_string);

    let resource = entry.get("resource").filter(|r| !r.is_null()).cloned();
    match operation {
        Operation::Create | Operation::Update if resource.is_none() => {
            return Err(bad("resource is required"));
        }
        Operation::Update | Operation::Delete | Operation::Read if id.is_none() => {
            return Err(bad("request.url must include the resource id"));
        }
        _ => {}
    }

    Ok(BatchReadWriteRequest {
        operation,
        resource_type,
        id,
        resource,
        full_url: entry["fullUrl"].as_str().map(str::to_string),
    })
}

fn response_entry(result: BatchReadWriteResponse) -> BundleEntry {
    let status = match result.operation {
        Operation::Create => "201 Created",
        _ => "200 OK",
    };
    let resource = match result.operation {
        Operation::Delete => None,
        _ => Some(result.resource).filter(|r| !r.is_null()),
    };

    BundleEntry::transaction_result(
        resource,
        EntryResponse {
            status: status.to_string(),
            location: Some(format!(
                "{}/{}/_history/{}",
                result.resource_type, result.id, result.vid
            )),
            etag: Some(format!("W/\"{}\"", result.vid)),
            last_modified: Some(result.last_modified).filter(|ts| !ts.is_empty()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entries() {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [
                {
                    "fullUrl": "urn:uuid:1",
                    "resource": { "resourceType": "Patient" },
                    "request": { "method": "POST", "url": "Patient" }
                },
                {
                    "resource": { "resourceType": "Patient", "id": "p2" },
                    "request": { "method": "PUT", "url": "https://fhir.test/Patient/p2" }
                },
                { "request": { "method": "DELETE", "url": "Patient/p3" } },
                { "request": { "method": "GET", "url": "/Patient/p4?_format=json" } }
            ]
        });

        let entries = parse_transaction(&bundle, "https://fhir.test").unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].id, None);
        assert_eq!(entries[0].full_url.as_deref(), Some("urn:uuid:1"));
        assert_eq!(entries[1].operation, Operation::Update);
        assert_eq!(entries[1].id.as_deref(), Some("p2"));
        assert_eq!(entries[2].operation, Operation::Delete);
        assert_eq!(entries[3].operation, Operation::Read);
        assert_eq!(entries[3].id.as_deref(), Some("p4"));
        assert_eq!(entries[3].resource_type, "Patient");
    }

    #[test]
    fn test_rejects_non_transaction_bundle() {
        let batch = json!({ "resourceType": "Bundle", "type": "batch", "entry": [] });
        assert!(matches!(
            parse_transaction(&batch, ""),
            Err(RestError::BadRequest { .. })
        ));

        let patient = json!({ "resourceType": "Patient" });
        assert!(parse_transaction(&patient, "").is_err());
    }

    #[test]
    fn test_rejects_too_many_entries() {
        let entry = json!({ "request": { "method": "DELETE", "url": "Patient/p1" } });
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": vec![entry; MAX_TRANSACTION_ENTRIES + 1]
        });
        assert!(parse_transaction(&bundle, "").is_err());
    }

    #[test]
    fn test_rejects_update_without_id() {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [{
                "resource": { "resourceType": "Patient" },
                "request": { "method": "PUT", "url": "Patient" }
            }]
        });
        assert!(parse_transaction(&bundle, "").is_err());
    }

    #[test]
    fn test_rejects_binary_entries() {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [{
                "resource": {
                    "resourceType": "Binary",
                    "contentType": "text/plain",
                    "data": "aGk="
                },
                "request": { "method": "POST", "url": "Binary" }
            }]
        });
        match parse_transaction(&bundle, "") {
            Err(RestError::BadRequest { message }) => {
                assert!(message.starts_with("Bundle.entry[0]"));
                assert!(message.contains("Binary"));
            }
            _ => panic!("expected a bad request"),
        }
    }

    #[test]
    fn test_response_entry() {
        let entry = response_entry(BatchReadWriteResponse {
            id: "p1".to_string(),
            vid: "1".to_string(),
            operation: Operation::Create,
            resource_type: "Patient".to_string(),
            resource: json!({ "resourceType": "Patient", "id": "p1" }),
            last_modified: "2024-01-01T00:00:00.000Z".to_string(),
        })
        .to_json();

        assert_eq!(entry["response"]["status"], "201 Created");
        assert_eq!(entry["response"]["location"], "Patient/p1/_history/1");
        assert_eq!(entry["response"]["etag"], "W/\"1\"");
        assert_eq!(entry["resource"]["id"], "p1");
    }
}
