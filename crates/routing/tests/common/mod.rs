//! Mock collaborators and configuration builders for router tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fhircloud_interface::stubs::{HistoryStub, SearchStub};
use fhircloud_interface::{
    AuthConfig, AuthService, AuthStrategy, Authorization, AuthorizationBundleRequest,
    AuthorizationRequest, BatchReadWriteResponse, BulkDataAccess, Bundle, BundleRequest,
    BundleResponse, Claims, ExportJobStatus, FhirConfig, FhirError, FhirResult, FhirVersion,
    GenericResponse, GetExportStatusResponse, GlobalSearchRequest, InitiateExportRequest,
    LoggingConfig, Operation, Persistence, ProductInfo, Profile, ReadResourceRequest,
    ResourceDescriptor, Search, SearchEntry, SearchResponse, SearchResult, ServerInfo,
    SystemOperation, TypeSearchRequest, VReadResourceRequest,
};
use serde_json::{Value, json};

pub const BASE_URL: &str = "https://fhir.test";

/// In-memory persistence keyed by `(tenant, type, id)`; every resource is version 1.
#[derive(Default)]
pub struct MockPersistence {
    resources: Mutex<HashMap<(String, String, String), Value>>,
    pub tenants_seen: Mutex<Vec<String>>,
}

impl MockPersistence {
    pub fn insert(&self, tenant: &str, resource: Value) {
        let key = (
            tenant.to_string(),
            resource["resourceType"].as_str().unwrap().to_string(),
            resource["id"].as_str().unwrap().to_string(),
        );
        self.resources.lock().unwrap().insert(key, resource);
    }

    fn get(&self, tenant: &str, resource_type: &str, id: &str) -> Option<Value> {
        self.tenants_seen.lock().unwrap().push(tenant.to_string());
        self.resources
            .lock()
            .unwrap()
            .get(&(tenant.to_string(), resource_type.to_string(), id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl Persistence for MockPersistence {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn read_resource(&self, request: &ReadResourceRequest) -> FhirResult<GenericResponse> {
        self.get(&request.tenant_id, &request.resource_type, &request.id)
            .map(GenericResponse::new)
            .ok_or_else(|| FhirError::not_found(&request.resource_type, &request.id))
    }

    async fn vread_resource(
        &self,
        request: &VReadResourceRequest,
    ) -> FhirResult<GenericResponse> {
        match self.get(&request.tenant_id, &request.resource_type, &request.id) {
            Some(resource) if request.vid == "1" => Ok(GenericResponse::new(resource)),
            _ => Err(FhirError::ResourceVersionNotFound {
                resource_type: request.resource_type.clone(),
                id: request.id.clone(),
                vid: request.vid.clone(),
            }),
        }
    }
}

/// Search returning a fixed page and recording every request.
#[derive(Default)]
pub struct MockSearch {
    pub total: u64,
    pub requests: Mutex<Vec<TypeSearchRequest>>,
}

#[async_trait]
impl Search for MockSearch {
    fn name(&self) -> &'static str {
        "mock-search"
    }

    async fn type_search(&self, request: &TypeSearchRequest) -> FhirResult<SearchResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let resource = json!({ "resourceType": request.resource_type, "id": "match-1" });
        Ok(SearchResponse {
            result: SearchResult {
                number_of_results: self.total,
                first_result: 0,
                page_size: 1,
                entries: vec![SearchEntry {
                    full_url: format!("{}/{}/match-1", request.base_url, request.resource_type),
                    resource,
                }],
                has_more: self.total > 1,
            },
        })
    }

    async fn global_search(&self, _request: &GlobalSearchRequest) -> FhirResult<SearchResponse> {
        Ok(SearchResponse::default())
    }
}

/// Bundle service that applies nothing and echoes each entry as version 1.
#[derive(Default)]
pub struct MockBundle {
    pub requests: Mutex<Vec<BundleRequest>>,
}

#[async_trait]
impl Bundle for MockBundle {
    fn name(&self) -> &'static str {
        "mock-bundle"
    }

    async fn transaction(&self, request: &BundleRequest) -> FhirResult<BundleResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let responses = request
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let id = entry.id.clone().unwrap_or_else(|| format!("new-{}", i));
                BatchReadWriteResponse {
                    resource: entry
                        .resource
                        .clone()
                        .map(|mut r| {
                            r["id"] = json!(id);
                            r
                        })
                        .unwrap_or(Value::Null),
                    id,
                    vid: "1".to_string(),
                    operation: entry.operation,
                    resource_type: entry.resource_type.clone(),
                    last_modified: "2024-01-01T00:00:00.000Z".to_string(),
                }
            })
            .collect();

        Ok(BundleResponse {
            success: true,
            message: "Successfully committed requests to DB".to_string(),
            responses,
        })
    }
}

/// Authorization that denies the token `deny` and any bundle containing a delete.
///
/// The claims carry the token as `sub`.
#[derive(Default)]
pub struct MockAuthz;

#[async_trait]
impl Authorization for MockAuthz {
    fn name(&self) -> &'static str {
        "mock-authz"
    }

    async fn verify_access_token(&self, request: &AuthorizationRequest) -> FhirResult<Claims> {
        if request.access_token == "deny" {
            return Err(FhirError::Unauthorized("access denied".to_string()));
        }
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), json!(request.access_token));
        Ok(claims)
    }

    async fn is_bundle_request_authorized(
        &self,
        request: &AuthorizationBundleRequest,
    ) -> FhirResult<()> {
        if request
            .requests
            .iter()
            .any(|r| r.operation == Operation::Delete)
        {
            return Err(FhirError::Unauthorized("delete denied".to_string()));
        }
        Ok(())
    }

    async fn is_export_authorized(&self, _claims: &Claims) -> FhirResult<()> {
        Ok(())
    }
}

/// In-memory export jobs.
#[derive(Default)]
pub struct MockBulkData {
    pub jobs: Mutex<HashMap<String, GetExportStatusResponse>>,
}

impl MockBulkData {
    pub fn set_status(&self, job_id: &str, status: ExportJobStatus) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(job_id) {
            job.job_status = status;
        }
    }
}

#[async_trait]
impl BulkDataAccess for MockBulkData {
    async fn initiate_export(&self, request: &InitiateExportRequest) -> FhirResult<String> {
        let mut jobs = self.jobs.lock().unwrap();
        let job_id = format!("job-{}", jobs.len() + 1);
        jobs.insert(
            job_id.clone(),
            GetExportStatusResponse {
                job_id: job_id.clone(),
                job_status: ExportJobStatus::InProgress,
                job_owner_id: request.requester_user_id.clone(),
                export_type: request.export_type,
                transaction_time: request.transaction_time.to_rfc3339(),
                output_format: request.output_format.clone(),
                since: request.since.clone(),
                types: request.types.clone(),
                group_id: None,
                error_message: None,
            },
        );
        Ok(job_id)
    }

    async fn get_export_status(
        &self,
        job_id: &str,
        _tenant_id: &str,
    ) -> FhirResult<GetExportStatusResponse> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| FhirError::not_found("$export", job_id))
    }

    async fn cancel_export(&self, job_id: &str, _tenant_id: &str) -> FhirResult<()> {
        self.set_status(job_id, ExportJobStatus::Canceling);
        Ok(())
    }
}

/// Collaborators shared by a test configuration.
#[derive(Default)]
pub struct Mocks {
    pub persistence: Arc<MockPersistence>,
    pub search: Arc<MockSearch>,
    pub bundle: Arc<MockBundle>,
    pub bulk_data: Arc<MockBulkData>,
}

impl Mocks {
    pub fn descriptor(&self, operations: &[Operation]) -> ResourceDescriptor {
        ResourceDescriptor {
            operations: operations.to_vec(),
            fhir_versions: vec![FhirVersion::R4],
            persistence: self.persistence.clone(),
            type_search: self.search.clone(),
            type_history: Arc::new(HistoryStub),
        }
    }

    /// Patient with read/search-type, plus a generic read-only descriptor.
    pub fn config(&self, system_operations: Vec<SystemOperation>) -> FhirConfig {
        let mut resources = BTreeMap::new();
        resources.insert(
            "Patient".to_string(),
            self.descriptor(&[Operation::Read, Operation::SearchType]),
        );

        FhirConfig {
            config_version: 1.0,
            product_info: ProductInfo {
                org_name: "Test Org".to_string(),
            },
            auth: AuthConfig {
                authorization: Arc::new(MockAuthz),
                strategy: AuthStrategy {
                    service: AuthService::OAuth,
                    oauth_policy: None,
                },
            },
            server: ServerInfo {
                url: format!("{}/", BASE_URL),
            },
            logging: LoggingConfig {
                level: "error".to_string(),
            },
            profile: Profile {
                system_operations,
                bundle: self.bundle.clone(),
                system_history: Arc::new(HistoryStub),
                system_search: Arc::new(SearchStub),
                bulk_data_access: Some(self.bulk_data.clone() as Arc<dyn BulkDataAccess>),
                fhir_version: FhirVersion::R4,
                generic_resource: Some(self.descriptor(&[Operation::Read])),
                resources,
            },
        }
    }
}
