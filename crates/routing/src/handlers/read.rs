//! Read interaction handler.
//!
//! `GET [base]/[type]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use fhircloud_interface::{Operation, ReadResourceRequest};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::{AccessToken, RequestContextExtractor};
use crate::responses::resource_response;
use crate::state::AppState;

/// Handler for the read interaction.
///
/// # Response
///
/// - `200 OK` - the current version, with `ETag` and `Last-Modified`
/// - `401 Unauthorized` - the token does not allow reading the type
/// - `404 Not Found` - unknown type, unknown id, or deleted resource
/// - `405 Method Not Allowed` - read is not enabled for the type
pub async fn read_handler(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    token: AccessToken,
    context: RequestContextExtractor,
) -> RestResult<Response> {
    debug!(
        resource_type = %resource_type,
        id = %id,
        tenant = %context.tenant_id(),
        "Processing read request"
    );

    state
        .authorize(token.as_str(), Operation::Read, Some(&resource_type))
        .await?;
    let descriptor = state.resource_for(&resource_type, Operation::Read)?;

    let request = ReadResourceRequest {
        resource_type,
        id,
        tenant_id: context.tenant_id().to_string(),
    };
    let response = descriptor.persistence.read_resource(&request).await?;

    Ok(resource_response(StatusCode::OK, response.resource))
}
