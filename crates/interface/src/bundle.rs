//! Transaction bundle contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FhirResult;
use crate::operation::Operation;

/// One entry of a transaction bundle, already parsed by the router.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReadWriteRequest {
    /// `Create`, `Read`, `Update` or `Delete`.
    pub operation: Operation,
    /// The FHIR resource type targeted by the entry.
    pub resource_type: String,
    /// The logical id; absent for creates without a client-assigned id.
    pub id: Option<String>,
    /// The resource body for creates and updates.
    pub resource: Option<Value>,
    /// The entry's `fullUrl`, if given.
    pub full_url: Option<String>,
}

/// Request to process a transaction bundle atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleRequest {
    /// Parsed bundle entries, in bundle order.
    pub entries: Vec<BatchReadWriteRequest>,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// Outcome of a single bundle entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReadWriteResponse {
    /// The logical id of the affected resource.
    pub id: String,
    /// The version id after the operation.
    pub vid: String,
    /// The operation that was performed.
    pub operation: Operation,
    /// The FHIR resource type.
    pub resource_type: String,
    /// The resource body (for reads, creates and updates), or `Value::Null`.
    pub resource: Value,
    /// RFC 3339 timestamp of the change.
    pub last_modified: String,
}

/// Outcome of a transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleResponse {
    /// Whether every entry was applied.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
    /// Per-entry outcomes, in bundle order.
    pub responses: Vec<BatchReadWriteResponse>,
}

/// Transaction processing.
#[async_trait]
pub trait Bundle: Send + Sync {
    /// Returns a short name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Applies all entries atomically.
    ///
    /// # Errors
    ///
    /// * `FhirError::InvalidResource` - If the bundle cannot be applied
    async fn transaction(&self, request: &BundleRequest) -> FhirResult<BundleResponse>;
}
