//! Bulk export job records kept by [`DynamoDbDataService`].

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use fhircloud_interface::{
    BulkDataAccess, ExportJobStatus, FhirError, FhirResult, GetExportStatusResponse,
    InitiateExportRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::data_service::DynamoDbDataService;
use crate::dynamodb::{DynamoDbClientError, Item, from_item, get_str, to_item};
use crate::error::DYNAMODB;

/// Maximum number of in-progress export jobs per tenant.
pub const MAX_CONCURRENT_EXPORT_JOBS: usize = 2;

/// Secondary index of the export table keyed on `jobStatus`.
pub const JOB_STATUS_INDEX: &str = "jobStatus-index";

const JOB_ID_FIELD: &str = "jobId";
const JOB_STATUS_FIELD: &str = "jobStatus";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportJobRecord {
    #[serde(flatten)]
    status: GetExportStatusResponse,
    #[serde(default)]
    tenant_id: String,
}

fn job_key(job_id: &str) -> Item {
    Item::from([(JOB_ID_FIELD.to_string(), AttributeValue::S(job_id.to_string()))])
}

impl DynamoDbDataService {
    async fn load_job(&self, job_id: &str, tenant_id: &str) -> FhirResult<ExportJobRecord> {
        let not_found = || FhirError::not_found("$export", job_id);

        let item = self
            .client
            .get_item(&self.export_table, job_key(job_id))
            .await?
            .ok_or_else(not_found)?;

        let record: ExportJobRecord = serde_json::from_value(from_item(&item)).map_err(|e| {
            FhirError::backend(DYNAMODB, format!("malformed export job {job_id}: {e}"))
        })?;

        if record.tenant_id != tenant_id {
            return Err(not_found());
        }
        Ok(record)
    }
}

#[async_trait]
impl BulkDataAccess for DynamoDbDataService {
    async fn initiate_export(&self, request: &InitiateExportRequest) -> FhirResult<String> {
        let in_progress = self
            .client
            .query_index(
                &self.export_table,
                JOB_STATUS_INDEX,
                JOB_STATUS_FIELD,
                ExportJobStatus::InProgress.as_str(),
            )
            .await?
            .iter()
            .filter(|item| get_str(item, "tenantId").unwrap_or_default() == request.tenant_id)
            .count();

        if in_progress >= MAX_CONCURRENT_EXPORT_JOBS {
            warn!(in_progress, "Rejecting export request: too many jobs in progress");
            return Err(FhirError::TooManyConcurrentExports);
        }

        let job_id = Uuid::new_v4().to_string();
        let record = ExportJobRecord {
            status: GetExportStatusResponse {
                job_id: job_id.clone(),
                job_status: ExportJobStatus::InProgress,
                job_owner_id: request.requester_user_id.clone(),
                export_type: request.export_type,
                transaction_time: request.transaction_time.to_rfc3339(),
                output_format: request.output_format.clone(),
                since: request.since.clone(),
                types: request.types.clone(),
                group_id: request.group_id.clone(),
                error_message: None,
            },
            tenant_id: request.tenant_id.clone(),
        };

        let value = serde_json::to_value(&record).map_err(|e| {
            FhirError::backend(DYNAMODB, format!("failed to serialize export job: {e}"))
        })?;
        self.client
            .put_item(&self.export_table, to_item(&value)?)
            .await?;

        info!(job_id = %job_id, export_type = %request.export_type.as_str(), "Export job created");
        Ok(job_id)
    }

    async fn get_export_status(
        &self,
        job_id: &str,
        tenant_id: &str,
    ) -> FhirResult<GetExportStatusResponse> {
        debug!(job_id = %job_id, "Loading export job status");
        Ok(self.load_job(job_id, tenant_id).await?.status)
    }

    async fn cancel_export(&self, job_id: &str, tenant_id: &str) -> FhirResult<()> {
        let record = self.load_job(job_id, tenant_id).await?;

        match record.status.job_status {
            ExportJobStatus::InProgress => {}
            ExportJobStatus::Canceling => return Ok(()),
            finished => {
                return Err(FhirError::InvalidResource(format!(
                    "job cannot be canceled because it is already in {finished} state"
                )));
            }
        }

        let result = self
            .client
            .update_attribute(
                &self.export_table,
                job_key(job_id),
                JOB_STATUS_FIELD,
                AttributeValue::S(ExportJobStatus::Canceling.as_str().to_string()),
                Some((
                    JOB_STATUS_FIELD,
                    AttributeValue::S(ExportJobStatus::InProgress.as_str().to_string()),
                )),
            )
            .await;

        match result {
            Ok(()) => {
                info!(job_id = %job_id, "Export job cancellation requested");
                Ok(())
            }
            Err(DynamoDbClientError::ConditionalCheckFailed) => Err(FhirError::InvalidResource(
                format!("job {job_id} is no longer in progress"),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::DynamoDbApi;
    use crate::dynamodb::mock::MockDynamoDb;
    use chrono::Utc;
    use fhircloud_interface::ExportType;
    use std::sync::Arc;

    const EXPORT_TABLE: &str = "export-request-dev";

    fn service(mock: Arc<MockDynamoDb>) -> DynamoDbDataService {
        DynamoDbDataService::new(mock, "resource-db-dev", EXPORT_TABLE)
    }

    fn request(tenant: &str) -> InitiateExportRequest {
        InitiateExportRequest {
            requester_user_id: "user-1".to_string(),
            export_type: ExportType::System,
            transaction_time: Utc::now(),
            output_format: Some("application/fhir+ndjson".to_string()),
            since: None,
            types: Some("Patient".to_string()),
            group_id: None,
            tenant_id: tenant.to_string(),
        }
    }

    #[tokio::test]
    async fn test_initiate_and_read_status() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = service(mock.clone());

        let job_id = service.initiate_export(&request("")).await.unwrap();
        let status = service.get_export_status(&job_id, "").await.unwrap();

        assert_eq!(status.job_id, job_id);
        assert_eq!(status.job_status, ExportJobStatus::InProgress);
        assert_eq!(status.job_owner_id, "user-1");
        assert_eq!(status.types.as_deref(), Some("Patient"));
        assert!(status.since.is_none());
        assert_eq!(mock.items(EXPORT_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_per_tenant() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = service(mock);

        service.initiate_export(&request("")).await.unwrap();
        service.initiate_export(&request("")).await.unwrap();
        let err = service.initiate_export(&request("")).await.unwrap_err();
        assert_eq!(err, FhirError::TooManyConcurrentExports);

        assert!(service.initiate_export(&request("-abc")).await.is_ok());
    }

    #[tokio::test]
    async fn test_status_is_scoped_to_tenant() {
        let service = service(Arc::new(MockDynamoDb::new()));
        let job_id = service.initiate_export(&request("-abc")).await.unwrap();

        assert!(service.get_export_status(&job_id, "-abc").await.is_ok());
        let err = service.get_export_status(&job_id, "").await.unwrap_err();
        assert!(matches!(err, FhirError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_moves_job_to_canceling() {
        let service = service(Arc::new(MockDynamoDb::new()));
        let job_id = service.initiate_export(&request("")).await.unwrap();

        service.cancel_export(&job_id, "").await.unwrap();
        let status = service.get_export_status(&job_id, "").await.unwrap();
        assert_eq!(status.job_status, ExportJobStatus::Canceling);

        // A second cancel is a no-op.
        assert!(service.cancel_export(&job_id, "").await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_finished_job_is_rejected() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = service(mock.clone());
        let job_id = service.initiate_export(&request("")).await.unwrap();

        mock.update_attribute(
            EXPORT_TABLE,
            job_key(&job_id),
            JOB_STATUS_FIELD,
            AttributeValue::S("completed".to_string()),
            None,
        )
        .await
        .unwrap();

        let err = service.cancel_export(&job_id, "").await.unwrap_err();
        assert!(matches!(err, FhirError::InvalidResource(msg) if msg.contains("completed")));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let service = service(Arc::new(MockDynamoDb::new()));
        let err = service.cancel_export("missing", "").await.unwrap_err();
        assert_eq!(err, FhirError::not_found("$export", "missing"));
    }
}
