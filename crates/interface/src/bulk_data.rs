//! Bulk data (`$export`) contract.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FhirError, FhirResult};

/// Scope of a bulk export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    /// Every resource in the system.
    System,
    /// Resources in the patient compartment.
    Patient,
    /// Resources for members of a group.
    Group,
}

impl ExportType {
    /// Returns the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::System => "system",
            ExportType::Patient => "patient",
            ExportType::Group => "group",
        }
    }
}

impl FromStr for ExportType {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(ExportType::System),
            "patient" => Ok(ExportType::Patient),
            "group" => Ok(ExportType::Group),
            other => Err(FhirError::InvalidResource(format!(
                "unknown export type: {}",
                other
            ))),
        }
    }
}

/// Lifecycle state of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportJobStatus {
    /// The job is running.
    InProgress,
    /// The job finished and its output is available.
    Completed,
    /// The job failed.
    Failed,
    /// Cancellation was requested.
    Canceling,
    /// The job was cancelled.
    Canceled,
}

impl ExportJobStatus {
    /// Returns the stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportJobStatus::InProgress => "in-progress",
            ExportJobStatus::Completed => "completed",
            ExportJobStatus::Failed => "failed",
            ExportJobStatus::Canceling => "canceling",
            ExportJobStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ExportJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportJobStatus {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-progress" => Ok(ExportJobStatus::InProgress),
            "completed" => Ok(ExportJobStatus::Completed),
            "failed" => Ok(ExportJobStatus::Failed),
            "canceling" => Ok(ExportJobStatus::Canceling),
            "canceled" => Ok(ExportJobStatus::Canceled),
            other => Err(FhirError::InvalidResource(format!(
                "unknown export job status: {}",
                other
            ))),
        }
    }
}

/// Request to start an export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateExportRequest {
    /// Subject claim of the requester; owner of the job.
    pub requester_user_id: String,
    /// Scope of the export.
    pub export_type: ExportType,
    /// Point in time the export is consistent with.
    pub transaction_time: DateTime<Utc>,
    /// `_outputFormat` parameter.
    pub output_format: Option<String>,
    /// `_since` parameter.
    pub since: Option<String>,
    /// `_type` parameter.
    pub types: Option<String>,
    /// Group id for group exports.
    pub group_id: Option<String>,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// Stored state of an export job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetExportStatusResponse {
    /// The job id.
    pub job_id: String,
    /// Current status.
    pub job_status: ExportJobStatus,
    /// Subject claim of the requester.
    pub job_owner_id: String,
    /// Scope of the export.
    pub export_type: ExportType,
    /// Point in time the export is consistent with (RFC 3339).
    pub transaction_time: String,
    /// `_outputFormat` parameter.
    pub output_format: Option<String>,
    /// `_since` parameter.
    pub since: Option<String>,
    /// `_type` parameter.
    #[serde(rename = "type")]
    pub types: Option<String>,
    /// Group id for group exports.
    pub group_id: Option<String>,
    /// Failure reason, when the job failed.
    pub error_message: Option<String>,
}

/// Bulk export job management.
#[async_trait]
pub trait BulkDataAccess: Send + Sync {
    /// Records a new export job and returns its id.
    ///
    /// # Errors
    ///
    /// * `FhirError::TooManyConcurrentExports` - If too many jobs are in progress
    async fn initiate_export(&self, request: &InitiateExportRequest) -> FhirResult<String>;

    /// Returns the stored state of a job.
    ///
    /// # Errors
    ///
    /// * `FhirError::ResourceNotFound` - If the job does not exist
    async fn get_export_status(
        &self,
        job_id: &str,
        tenant_id: &str,
    ) -> FhirResult<GetExportStatusResponse>;

    /// Requests cancellation of an in-progress job.
    ///
    /// # Errors
    ///
    /// * `FhirError::ResourceNotFound` - If the job does not exist
    /// * `FhirError::InvalidResource` - If the job has already finished
    async fn cancel_export(&self, job_id: &str, tenant_id: &str) -> FhirResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_strings() {
        assert_eq!(ExportJobStatus::InProgress.as_str(), "in-progress");
        assert_eq!(
            "canceling".parse::<ExportJobStatus>().unwrap(),
            ExportJobStatus::Canceling
        );
        assert!("paused".parse::<ExportJobStatus>().is_err());
    }

    #[test]
    fn test_status_response_serializes_camel_case() {
        let status = GetExportStatusResponse {
            job_id: "job-1".to_string(),
            job_status: ExportJobStatus::InProgress,
            job_owner_id: "user-1".to_string(),
            export_type: ExportType::System,
            transaction_time: "2024-01-01T00:00:00Z".to_string(),
            output_format: None,
            since: None,
            types: Some("Patient".to_string()),
            group_id: None,
            error_message: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["jobStatus"], "in-progress");
        assert_eq!(json["exportType"], "system");
        assert_eq!(json["type"], "Patient");
    }
}
