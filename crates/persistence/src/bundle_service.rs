//! Transaction bundles applied with a single `TransactWriteItems` call.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{SecondsFormat, Utc};
use fhircloud_interface::{
    BatchReadWriteRequest, BatchReadWriteResponse, Bundle, BundleRequest, BundleResponse,
    FhirError, FhirResult, Operation,
};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clean::clean_item;
use crate::data_service::{cleaned, read_latest};
use crate::document_status::DocumentStatus;
use crate::dynamodb::{
    DOCUMENT_STATUS_FIELD, DynamoDbApi, TransactWrite, VID_FIELD, get_str, get_u64,
    resource_key, tenant_table, to_attribute_value, to_item,
};

/// Maximum number of entries accepted in one transaction.
pub const MAX_BUNDLE_ENTRIES: usize = 25;

/// Binary payloads live in the object store and cannot be written here.
const BINARY_RESOURCE_TYPE: &str = "Binary";

pub struct DynamoDbBundleService {
    client: Arc<dyn DynamoDbApi>,
    resource_table: String,
}

impl DynamoDbBundleService {
    pub fn new(client: Arc<dyn DynamoDbApi>, resource_table: impl Into<String>) -> Self {
        Self {
            client,
            resource_table: resource_table.into(),
        }
    }

    /// Stages one write entry, returning its write and its response.
    async fn stage_write(
        &self,
        table: &str,
        entry: &BatchReadWriteRequest,
        last_modified: &str,
    ) -> FhirResult<(TransactWrite, BatchReadWriteResponse)> {
        match entry.operation {
            Operation::Create => {
                let id = entry
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                self.stage_put(table, entry, id, 1, last_modified)
            }
            Operation::Update => {
                let id = require_id(entry)?;
                let next_vid = match self.client.query_latest(table, &id).await? {
                    Some(latest) => {
                        let stored_type = get_str(&latest, "resourceType").unwrap_or_default();
                        if stored_type != entry.resource_type {
                            return Err(FhirError::InvalidResource(format!(
                                "id {id} already belongs to a {stored_type} resource, cannot update it as {}",
                                entry.resource_type
                            )));
                        }
                        get_u64(&latest, VID_FIELD).unwrap_or_default() + 1
                    }
                    None => 1,
                };
                self.stage_put(table, entry, id, next_vid, last_modified)
            }
            Operation::Delete => {
                let id = require_id(entry)?;
                let latest =
                    read_latest(self.client.as_ref(), table, &entry.resource_type, &id).await?;
                let vid = get_u64(&latest, VID_FIELD).unwrap_or(1);

                let write = TransactWrite::SetAttribute {
                    table: table.to_string(),
                    key: resource_key(&id, vid),
                    attribute: DOCUMENT_STATUS_FIELD.to_string(),
                    value: AttributeValue::S(DocumentStatus::Deleted.as_str().to_string()),
                };
                let response = BatchReadWriteResponse {
                    id,
                    vid: vid.to_string(),
                    operation: Operation::Delete,
                    resource_type: entry.resource_type.clone(),
                    resource: Value::Null,
                    last_modified: last_modified.to_string(),
                };
                Ok((write, response))
            }
            other => Err(FhirError::InvalidResource(format!(
                "operation {other} is not supported in a transaction"
            ))),
        }
    }

    fn stage_put(
        &self,
        table: &str,
        entry: &BatchReadWriteRequest,
        id: String,
        vid: u64,
        last_modified: &str,
    ) -> FhirResult<(TransactWrite, BatchReadWriteResponse)> {
        let mut resource = match &entry.resource {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => {
                return Err(FhirError::InvalidResource(format!(
                    "{} entry for {} is missing a resource body",
                    entry.operation, entry.resource_type
                )));
            }
        };

        if resource.get("resourceType").and_then(Value::as_str) != Some(entry.resource_type.as_str()) {
            return Err(FhirError::InvalidResource(format!(
                "resource body does not match resource type {}",
                entry.resource_type
            )));
        }

        resource["id"] = Value::String(id.clone());
        let meta = resource
            .as_object_mut()
            .map(|map| map.entry("meta").or_insert_with(|| json!({})));
        if let Some(Value::Object(meta)) = meta {
            meta.insert("versionId".to_string(), json!(vid.to_string()));
            meta.insert("lastUpdated".to_string(), json!(last_modified));
        } else {
            return Err(FhirError::InvalidResource("meta must be an object".to_string()));
        }

        let mut item = to_item(&resource)?;
        item.insert(VID_FIELD.to_string(), to_attribute_value(&json!(vid)));
        item.insert(
            DOCUMENT_STATUS_FIELD.to_string(),
            AttributeValue::S(DocumentStatus::Available.as_str().to_string()),
        );

        let response = BatchReadWriteResponse {
            id,
            vid: vid.to_string(),
            operation: entry.operation,
            resource_type: entry.resource_type.clone(),
            resource: clean_item(resource),
            last_modified: last_modified.to_string(),
        };

        Ok((
            TransactWrite::PutNew {
                table: table.to_string(),
                item,
            },
            response,
        ))
    }
}

impl fmt::Debug for DynamoDbBundleService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoDbBundleService")
            .field("resource_table", &self.resource_table)
            .finish_non_exhaustive()
    }
}

fn require_id(entry: &BatchReadWriteRequest) -> FhirResult<String> {
    entry.id.clone().ok_or_else(|| {
        FhirError::InvalidResource(format!(
            "{} entry for {} requires an id",
            entry.operation, entry.resource_type
        ))
    })
}

#[async_trait]
impl Bundle for DynamoDbBundleService {
    fn name(&self) -> &'static str {
        "dynamodb-bundle"
    }

    async fn transaction(&self, request: &BundleRequest) -> FhirResult<BundleResponse> {
        if request.entries.len() > MAX_BUNDLE_ENTRIES {
            return Err(FhirError::InvalidResource(format!(
                "maximum number of entries for a bundle is {MAX_BUNDLE_ENTRIES}, there were {} entries",
                request.entries.len()
            )));
        }

        let table = tenant_table(&self.resource_table, &request.tenant_id);
        let last_modified = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut writes = Vec::new();
        let mut responses: Vec<Option<BatchReadWriteResponse>> =
            Vec::with_capacity(request.entries.len());

        if let Some(entry) = request
            .entries
            .iter()
            .find(|entry| entry.resource_type == BINARY_RESOURCE_TYPE)
        {
            return Err(FhirError::InvalidResource(format!(
                "{} resources cannot be part of a transaction",
                entry.resource_type
            )));
        }

        for entry in &request.entries {
            if entry.operation == Operation::Read {
                responses.push(None);
                continue;
            }
            let (write, response) = self.stage_write(&table, entry, &last_modified).await?;
            writes.push(write);
            responses.push(Some(response));
        }

        if !writes.is_empty() {
            debug!(table = %table, writes = writes.len(), "Committing transaction");
            self.client.transact_write(writes).await?;
        }

        let mut completed = Vec::with_capacity(responses.len());
        for (entry, response) in request.entries.iter().zip(responses) {
            let response = match response {
                Some(response) => response,
                None => {
                    let id = require_id(entry)?;
                    let item =
                        read_latest(self.client.as_ref(), &table, &entry.resource_type, &id)
                            .await?;
                    let resource = cleaned(&item);
                    BatchReadWriteResponse {
                        vid: get_u64(&item, VID_FIELD).unwrap_or(1).to_string(),
                        last_modified: resource["meta"]["lastUpdated"]
                            .as_str()
                            .unwrap_or_default()
                            .to_string(),
                        id,
                        operation: Operation::Read,
                        resource_type: entry.resource_type.clone(),
                        resource,
                    }
                }
            };
            completed.push(response);
        }

        info!(entries = completed.len(), "Transaction committed");
        Ok(BundleResponse {
            success: true,
            message: "Successfully committed requests to DB".to_string(),
            responses: completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::mock::MockDynamoDb;

    const TABLE: &str = "resource-db-dev";

    fn entry(
        operation: Operation,
        id: Option<&str>,
        resource: Option<Value>,
    ) -> BatchReadWriteRequest {
        BatchReadWriteRequest {
            operation,
            resource_type: "Patient".to_string(),
            id: id.map(str::to_string),
            resource,
            full_url: None,
        }
    }

    fn bundle(entries: Vec<BatchReadWriteRequest>) -> BundleRequest {
        BundleRequest {
            entries,
            tenant_id: String::new(),
        }
    }

    fn patient() -> Value {
        json!({ "resourceType": "Patient", "active": true })
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_meta() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock.clone(), TABLE);

        let response = service
            .transaction(&bundle(vec![entry(Operation::Create, None, Some(patient()))]))
            .await
            .unwrap();

        assert!(response.success);
        let created = &response.responses[0];
        assert_eq!(created.vid, "1");
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.resource["meta"]["versionId"], "1");
        assert_eq!(created.resource["meta"]["lastUpdated"], created.last_modified);
        assert_eq!(mock.transactions().len(), 1);

        let stored = mock.items(TABLE);
        assert_eq!(stored.len(), 1);
        assert_eq!(
            stored[0].get("documentStatus"),
            Some(&AttributeValue::S("AVAILABLE".to_string()))
        );
    }

    #[tokio::test]
    async fn test_update_writes_next_version() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock.clone(), TABLE);
        service
            .transaction(&bundle(vec![entry(Operation::Create, Some("p1"), Some(patient()))]))
            .await
            .unwrap();

        let response = service
            .transaction(&bundle(vec![entry(Operation::Update, Some("p1"), Some(patient()))]))
            .await
            .unwrap();

        assert_eq!(response.responses[0].vid, "2");
        assert_eq!(mock.items(TABLE).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_then_read_in_later_bundle_is_not_found() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock, TABLE);
        service
            .transaction(&bundle(vec![entry(Operation::Create, Some("p1"), Some(patient()))]))
            .await
            .unwrap();

        let deleted = service
            .transaction(&bundle(vec![entry(Operation::Delete, Some("p1"), None)]))
            .await
            .unwrap();
        assert_eq!(deleted.responses[0].resource, Value::Null);

        let err = service
            .transaction(&bundle(vec![entry(Operation::Read, Some("p1"), None)]))
            .await
            .unwrap_err();
        assert_eq!(err, FhirError::not_found("Patient", "p1"));
    }

    #[tokio::test]
    async fn test_reads_run_after_writes() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock, TABLE);

        let response = service
            .transaction(&bundle(vec![
                entry(Operation::Read, Some("p1"), None),
                entry(Operation::Create, Some("p1"), Some(patient())),
            ]))
            .await
            .unwrap();

        assert_eq!(response.responses[0].operation, Operation::Read);
        assert_eq!(response.responses[0].resource["id"], "p1");
        assert_eq!(response.responses[1].operation, Operation::Create);
    }

    #[tokio::test]
    async fn test_too_many_entries_rejected() {
        let service = DynamoDbBundleService::new(Arc::new(MockDynamoDb::new()), TABLE);
        let entries = (0..=MAX_BUNDLE_ENTRIES)
            .map(|_| entry(Operation::Create, None, Some(patient())))
            .collect();

        let err = service.transaction(&bundle(entries)).await.unwrap_err();
        assert!(matches!(err, FhirError::InvalidResource(msg) if msg.contains("26 entries")));
    }

    #[tokio::test]
    async fn test_mismatched_body_rejected() {
        let service = DynamoDbBundleService::new(Arc::new(MockDynamoDb::new()), TABLE);
        let body = json!({ "resourceType": "Observation" });

        let err = service
            .transaction(&bundle(vec![entry(Operation::Create, None, Some(body))]))
            .await
            .unwrap_err();
        assert!(matches!(err, FhirError::InvalidResource(_)));
    }

    #[tokio::test]
    async fn test_binary_entries_rejected_before_any_write() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock.clone(), TABLE);
        let binary = BatchReadWriteRequest {
            operation: Operation::Create,
            resource_type: "Binary".to_string(),
            id: Some("b1".to_string()),
            resource: Some(json!({
                "resourceType": "Binary",
                "contentType": "text/plain",
                "data": "aGk="
            })),
            full_url: None,
        };

        let err = service
            .transaction(&bundle(vec![
                entry(Operation::Create, Some("p1"), Some(patient())),
                binary,
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, FhirError::InvalidResource(msg) if msg.contains("Binary")));
        assert!(mock.transactions().is_empty());
        assert!(mock.items(TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_update_with_other_type_on_existing_id_rejected() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock.clone(), TABLE);
        service
            .transaction(&bundle(vec![entry(Operation::Create, Some("p1"), Some(patient()))]))
            .await
            .unwrap();

        let observation = BatchReadWriteRequest {
            operation: Operation::Update,
            resource_type: "Observation".to_string(),
            id: Some("p1".to_string()),
            resource: Some(json!({ "resourceType": "Observation", "status": "final" })),
            full_url: None,
        };
        let err = service
            .transaction(&bundle(vec![observation]))
            .await
            .unwrap_err();

        assert!(matches!(err, FhirError::InvalidResource(msg) if msg.contains("Patient")));
        assert_eq!(mock.items(TABLE).len(), 1);

        let read = service
            .transaction(&bundle(vec![entry(Operation::Read, Some("p1"), None)]))
            .await
            .unwrap();
        assert_eq!(read.responses[0].vid, "1");
        assert_eq!(read.responses[0].resource["resourceType"], "Patient");
    }

    #[tokio::test]
    async fn test_duplicate_create_cancels_transaction() {
        let mock = Arc::new(MockDynamoDb::new());
        let service = DynamoDbBundleService::new(mock.clone(), TABLE);
        let create = entry(Operation::Create, Some("p1"), Some(patient()));
        service.transaction(&bundle(vec![create.clone()])).await.unwrap();

        let err = service.transaction(&bundle(vec![create])).await.unwrap_err();
        assert!(matches!(err, FhirError::InvalidResource(_)));
        assert_eq!(mock.items(TABLE).len(), 1);
    }
}
