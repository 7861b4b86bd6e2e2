//! Authorization contract.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::bundle::BatchReadWriteRequest;
use crate::error::FhirResult;
use crate::operation::Operation;

/// Decoded access token claims.
pub type Claims = Map<String, Value>;

/// A request to verify that the bearer of an access token may perform an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// The raw bearer token (empty when no `Authorization` header was sent).
    pub access_token: String,
    /// The requested operation.
    pub operation: Operation,
    /// The targeted resource type, if any.
    pub resource_type: Option<String>,
    /// The targeted resource id, if any.
    pub id: Option<String>,
    /// The targeted version id, if any.
    pub vid: Option<String>,
}

impl AuthorizationRequest {
    /// Creates a request for an operation on a resource type.
    pub fn new(
        access_token: impl Into<String>,
        operation: Operation,
        resource_type: Option<&str>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            operation,
            resource_type: resource_type.map(str::to_string),
            id: None,
            vid: None,
        }
    }
}

/// A request to verify every entry of a transaction bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationBundleRequest {
    /// Claims returned by [`Authorization::verify_access_token`].
    pub claims: Claims,
    /// The parsed bundle entries.
    pub requests: Vec<BatchReadWriteRequest>,
}

/// Access control over FHIR operations.
#[async_trait]
pub trait Authorization: Send + Sync {
    /// Returns a short name identifying this implementation.
    fn name(&self) -> &'static str;

    /// Verifies the token and returns its claims when the operation is allowed.
    ///
    /// # Errors
    ///
    /// * `FhirError::Unauthorized` - If the token is invalid or the operation is denied
    async fn verify_access_token(&self, request: &AuthorizationRequest) -> FhirResult<Claims>;

    /// Verifies that every entry of a bundle is allowed.
    ///
    /// # Errors
    ///
    /// * `FhirError::Unauthorized` - If any entry is denied
    async fn is_bundle_request_authorized(
        &self,
        request: &AuthorizationBundleRequest,
    ) -> FhirResult<()>;

    /// Verifies that the claims allow starting a system-level bulk export.
    ///
    /// # Errors
    ///
    /// * `FhirError::Unauthorized` - If the export is denied
    async fn is_export_authorized(&self, claims: &Claims) -> FhirResult<()>;
}
