//! History interaction handlers.
//!
//! - `GET [base]/[type]/[id]/_history` - instance history
//! - `GET [base]/[type]/_history` - type history
//! - `GET [base]/_history` - system history

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use fhircloud_interface::{HistoryRequest, Operation, SystemOperation};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{AccessToken, QueryParams, RequestContextExtractor};
use crate::handlers::search::paged_bundle;
use crate::responses::{BundleBuilder, fhir_json};
use crate::state::AppState;

/// Handler for instance-level history.
pub async fn history_instance_handler(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    token: AccessToken,
    context: RequestContextExtractor,
    params: QueryParams,
) -> RestResult<Response> {
    debug!(
        resource_type = %resource_type,
        id = %id,
        tenant = %context.tenant_id(),
        "Processing instance history request"
    );

    state
        .authorize(token.as_str(), Operation::HistoryInstance, Some(&resource_type))
        .await?;
    let descriptor = state.resource_for(&resource_type, Operation::HistoryInstance)?;

    let request = HistoryRequest {
        resource_type: Some(resource_type.clone()),
        id: Some(id.clone()),
        query_params: params.0.clone(),
        base_url: state.base_url().to_string(),
        tenant_id: context.tenant_id().to_string(),
    };
    let response = descriptor.type_history.instance_history(&request).await?;

    let link_base = format!("{}/{}/{}/_history", state.base_url(), resource_type, id);
    let bundle = paged_bundle(BundleBuilder::history(), &response.result, &link_base, &params.0);
    Ok(fhir_json(StatusCode::OK, bundle))
}

/// Handler for type-level history.
pub async fn history_type_handler(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    token: AccessToken,
    context: RequestContextExtractor,
    params: QueryParams,
) -> RestResult<Response> {
    debug!(
        resource_type = %resource_type,
        tenant = %context.tenant_id(),
        "Processing type history request"
    );

    state
        .authorize(token.as_str(), Operation::HistoryType, Some(&resource_type))
        .await?;
    let descriptor = state.resource_for(&resource_type, Operation::HistoryType)?;

    let request = HistoryRequest {
        resource_type: Some(resource_type.clone()),
        id: None,
        query_params: params.0.clone(),
        base_url: state.base_url().to_string(),
        tenant_id: context.tenant_id().to_string(),
    };
    let response = descriptor.type_history.type_history(&request).await?;

    let link_base = format!("{}/{}/_history", state.base_url(), resource_type);
    let bundle = paged_bundle(BundleBuilder::history(), &response.result, &link_base, &params.0);
    Ok(fhir_json(StatusCode::OK, bundle))
}

/// Handler for system-level history.
pub async fn history_system_handler(
    State(state): State<AppState>,
    token: AccessToken,
    context: RequestContextExtractor,
    params: QueryParams,
) -> RestResult<Response> {
    debug!(tenant = %context.tenant_id(), "Processing system history request");

    state
        .authorize(token.as_str(), Operation::HistorySystem, None)
        .await?;
    if !state.profile().supports(SystemOperation::HistorySystem) {
        return Err(RestError::MethodNotAllowed {
            operation: SystemOperation::HistorySystem.to_string(),
            target: "system".to_string(),
        });
    }

    let request = HistoryRequest {
        resource_type: None,
        id: None,
        query_params: params.0.clone(),
        base_url: state.base_url().to_string(),
        tenant_id: context.tenant_id().to_string(),
    };
    let response = state.profile().system_history.system_history(&request).await?;

    let link_base = format!("{}/_history", state.base_url());
    let bundle = paged_bundle(BundleBuilder::history(), &response.result, &link_base, &params.0);
    Ok(fhir_json(StatusCode::OK, bundle))
}
