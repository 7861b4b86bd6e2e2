//! Bulk data export handlers.
//!
//! - `GET [base]/$export` - start a system-level export
//! - `GET [base]/$export/[jobId]` - poll a job
//! - `DELETE [base]/$export/[jobId]` - cancel a job

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use fhircloud_interface::{
    BulkDataAccess, Claims, ExportJobStatus, ExportType, InitiateExportRequest, Operation,
};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{RestError, RestResult, create_operation_outcome};
use crate::extractors::{AccessToken, QueryParams, RequestContextExtractor};
use crate::responses::fhir_json;
use crate::state::AppState;

/// Accepted `_outputFormat` values.
const NDJSON_FORMATS: &[&str] = &["application/fhir+ndjson", "application/ndjson", "ndjson"];

const PROGRESS_HEADER: &str = "x-progress";

fn bulk_data(state: &AppState) -> RestResult<&Arc<dyn BulkDataAccess>> {
    state
        .profile()
        .bulk_data_access
        .as_ref()
        .ok_or_else(|| RestError::NotImplemented {
            feature: "$export".to_string(),
        })
}

fn requester(claims: &Claims) -> String {
    claims
        .get("sub")
        .and_then(|sub| sub.as_str())
        .unwrap_or_default()
        .to_string()
}

fn export_url(state: &AppState, job_id: &str) -> String {
    format!("{}/$export/{}", state.base_url(), job_id)
}

/// Starts a system-level export and answers `202 Accepted` with the status URL.
pub async fn export_handler(
    State(state): State<AppState>,
    token: AccessToken,
    context: RequestContextExtractor,
    params: QueryParams,
) -> RestResult<Response> {
    debug!(tenant = %context.tenant_id(), "Processing export request");

    let claims = state.authorize(token.as_str(), Operation::Read, None).await?;
    state
        .config()
        .auth
        .authorization
        .is_export_authorized(&claims)
        .await?;
    let bulk_data = bulk_data(&state)?;

    let output_format = params.get("_outputFormat").map(str::to_string);
    if let Some(format) = &output_format {
        if !NDJSON_FORMATS.contains(&format.as_str()) {
            return Err(RestError::BadRequest {
                message: format!("Unsupported _outputFormat: {}", format),
            });
        }
    }

    let since = params.get("_since").map(str::to_string);
    if let Some(since) = &since {
        if DateTime::parse_from_rfc3339(since).is_err() {
            return Err(RestError::BadRequest {
                message: format!("Invalid _since: {}", since),
            });
        }
    }

    let request = InitiateExportRequest {
        requester_user_id: requester(&claims),
        export_type: ExportType::System,
        transaction_time: Utc::now(),
        output_format,
        since,
        types: params.get("_type").map(str::to_string),
        group_id: None,
        tenant_id: context.tenant_id().to_string(),
    };
    let job_id = bulk_data.initiate_export(&request).await?;
    info!(job_id = %job_id, "Export job started");

    let mut response = StatusCode::ACCEPTED.into_response();
    if let Ok(location) = HeaderValue::from_str(&export_url(&state, &job_id)) {
        response
            .headers_mut()
            .insert(header::CONTENT_LOCATION, location);
    }
    Ok(response)
}

/// Reports the state of an export job owned by the requester.
pub async fn export_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    token: AccessToken,
    context: RequestContextExtractor,
) -> RestResult<Response> {
    debug!(job_id = %job_id, tenant = %context.tenant_id(), "Processing export status request");

    let claims = state.authorize(token.as_str(), Operation::Read, None).await?;
    let bulk_data = bulk_data(&state)?;

    let status = bulk_data
        .get_export_status(&job_id, context.tenant_id())
        .await?;
    if status.job_owner_id != requester(&claims) {
        return Err(RestError::Unauthorized {
            message: "User does not have permission to access this job".to_string(),
        });
    }

    let response = match status.job_status {
        ExportJobStatus::InProgress | ExportJobStatus::Canceling => {
            let mut response = StatusCode::ACCEPTED.into_response();
            response.headers_mut().insert(
                PROGRESS_HEADER,
                HeaderValue::from_static(status.job_status.as_str()),
            );
            response
        }
        ExportJobStatus::Completed => fhir_json(
            StatusCode::OK,
            json!({
                "transactionTime": status.transaction_time,
                "request": export_url(&state, &job_id),
                "requiresAccessToken": true,
                "output": [],
                "error": []
            }),
        ),
        ExportJobStatus::Failed => fhir_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            create_operation_outcome(
                "error",
                "processing",
                status
                    .error_message
                    .as_deref()
                    .unwrap_or("Export job failed"),
            ),
        ),
        ExportJobStatus::Canceled => {
            return Err(RestError::NotFound {
                resource_type: "$export".to_string(),
                id: job_id,
            });
        }
    };
    Ok(response)
}

/// Requests cancellation of an export job owned by the requester.
pub async fn cancel_export_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    token: AccessToken,
    context: RequestContextExtractor,
) -> RestResult<Response> {
    debug!(job_id = %job_id, tenant = %context.tenant_id(), "Processing export cancel request");

    let claims = state.authorize(token.as_str(), Operation::Read, None).await?;
    let bulk_data = bulk_data(&state)?;

    let status = bulk_data
        .get_export_status(&job_id, context.tenant_id())
        .await?;
    if status.job_owner_id != requester(&claims) {
        return Err(RestError::Unauthorized {
            message: "User does not have permission to cancel this job".to_string(),
        });
    }

    bulk_data.cancel_export(&job_id, context.tenant_id()).await?;
    info!(job_id = %job_id, "Export job cancel requested");

    Ok(StatusCode::ACCEPTED.into_response())
}
