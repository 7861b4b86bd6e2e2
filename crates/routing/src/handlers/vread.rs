//! Version read interaction handler.
//!
//! `GET [base]/[type]/[id]/_history/[vid]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use fhircloud_interface::{Operation, VReadResourceRequest};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::{AccessToken, RequestContextExtractor};
use crate::responses::resource_response;
use crate::state::AppState;

/// Handler for the vread interaction.
pub async fn vread_handler(
    State(state): State<AppState>,
    Path((resource_type, id, version_id)): Path<(String, String, String)>,
    token: AccessToken,
    context: RequestContextExtractor,
) -> RestResult<Response> {
    debug!(
        resource_type = %resource_type,
        id = %id,
        version_id = %version_id,
        tenant = %context.tenant_id(),
        "Processing vread request"
    );

    state
        .authorize(token.as_str(), Operation::Vread, Some(&resource_type))
        .await?;
    let descriptor = state.resource_for(&resource_type, Operation::Vread)?;

    let request = VReadResourceRequest {
        resource_type,
        id,
        vid: version_id,
        tenant_id: context.tenant_id().to_string(),
    };
    let response = descriptor.persistence.vread_resource(&request).await?;

    Ok(resource_response(StatusCode::OK, response.resource))
}
