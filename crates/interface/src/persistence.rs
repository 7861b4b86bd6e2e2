//! Resource persistence contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FhirResult;

/// Request for the current version of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResourceRequest {
    /// The FHIR resource type (e.g. "Patient").
    pub resource_type: String,
    /// The resource's logical id.
    pub id: String,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// Request for a specific version of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VReadResourceRequest {
    /// The FHIR resource type.
    pub resource_type: String,
    /// The resource's logical id.
    pub id: String,
    /// The version id.
    pub vid: String,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// A resource returned from persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResponse {
    /// Human-readable outcome message.
    pub message: String,
    /// The resource body, with internal bookkeeping fields removed.
    pub resource: Value,
}

impl GenericResponse {
    /// Creates a response wrapping a resource.
    pub fn new(resource: Value) -> Self {
        Self {
            message: String::new(),
            resource,
        }
    }
}

/// Read access to stored FHIR resources.
///
/// Implementations must be safe to share across concurrent invocations.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Returns a short name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Reads the current version of a resource.
    ///
    /// # Errors
    ///
    /// * `FhirError::ResourceNotFound` - If the resource does not exist or is deleted
    async fn read_resource(&self, request: &ReadResourceRequest) -> FhirResult<GenericResponse>;

    /// Reads a specific version of a resource.
    ///
    /// # Errors
    ///
    /// * `FhirError::ResourceVersionNotFound` - If the version does not exist
    async fn vread_resource(&self, request: &VReadResourceRequest)
    -> FhirResult<GenericResponse>;
}
