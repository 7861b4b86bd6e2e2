//! Resource reads against the versioned resource table.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fhircloud_interface::{
    FhirError, FhirResult, GenericResponse, Persistence, ReadResourceRequest,
    VReadResourceRequest,
};
use serde_json::Value;
use tracing::debug;

use crate::clean::clean_item;
use crate::document_status::DocumentStatus;
use crate::dynamodb::{
    DOCUMENT_STATUS_FIELD, DynamoDbApi, Item, from_item, get_str, resource_key, tenant_table,
};

/// Document-store persistence over DynamoDB.
///
/// Every resource version is one item keyed on `id` + `vid`. Items carry a
/// `documentStatus`; the latest version of a deleted resource is `DELETED`.
/// The same service also manages bulk export jobs in a second table.
pub struct DynamoDbDataService {
    pub(crate) client: Arc<dyn DynamoDbApi>,
    pub(crate) resource_table: String,
    pub(crate) export_table: String,
}

impl DynamoDbDataService {
    pub fn new(
        client: Arc<dyn DynamoDbApi>,
        resource_table: impl Into<String>,
        export_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            resource_table: resource_table.into(),
            export_table: export_table.into(),
        }
    }
}

impl fmt::Debug for DynamoDbDataService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoDbDataService")
            .field("resource_table", &self.resource_table)
            .field("export_table", &self.export_table)
            .finish_non_exhaustive()
    }
}

/// Reads the latest version of a resource, treating deleted and mistyped items as missing.
pub(crate) async fn read_latest(
    client: &dyn DynamoDbApi,
    table: &str,
    resource_type: &str,
    id: &str,
) -> FhirResult<Item> {
    let item = client
        .query_latest(table, id)
        .await?
        .ok_or_else(|| FhirError::not_found(resource_type, id))?;

    if is_deleted(&item) || get_str(&item, "resourceType") != Some(resource_type) {
        return Err(FhirError::not_found(resource_type, id));
    }

    Ok(item)
}

pub(crate) fn is_deleted(item: &Item) -> bool {
    get_str(item, DOCUMENT_STATUS_FIELD) == Some(DocumentStatus::Deleted.as_str())
}

pub(crate) fn cleaned(item: &Item) -> Value {
    clean_item(from_item(item))
}

#[async_trait]
impl Persistence for DynamoDbDataService {
    fn name(&self) -> &'static str {
        "dynamodb"
    }

    async fn read_resource(&self, request: &ReadResourceRequest) -> FhirResult<GenericResponse> {
        let table = tenant_table(&self.resource_table, &request.tenant_id);
        debug!(table = %table, resource_type = %request.resource_type, id = %request.id, "Reading resource");

        let item = read_latest(
            self.client.as_ref(),
            &table,
            &request.resource_type,
            &request.id,
        )
        .await?;

        Ok(GenericResponse {
            message: "Resource found".to_string(),
            resource: cleaned(&item),
        })
    }

    async fn vread_resource(
        &self,
        request: &VReadResourceRequest,
    ) -> FhirResult<GenericResponse> {
        let version_not_found = || FhirError::ResourceVersionNotFound {
            resource_type: request.resource_type.clone(),
            id: request.id.clone(),
            vid: request.vid.clone(),
        };

        let vid: u64 = request.vid.parse().map_err(|_| version_not_found())?;
        let table = tenant_table(&self.resource_table, &request.tenant_id);
        debug!(table = %table, resource_type = %request.resource_type, id = %request.id, vid, "Reading resource version");

        let item = self
            .client
            .get_item(&table, resource_key(&request.id, vid))
            .await?
            .ok_or_else(version_not_found)?;

        if get_str(&item, "resourceType") != Some(request.resource_type.as_str()) {
            return Err(version_not_found());
        }

        Ok(GenericResponse {
            message: "Resource found".to_string(),
            resource: cleaned(&item),
        })
    }
}
