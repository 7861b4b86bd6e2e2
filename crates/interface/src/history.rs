//! History contract.
//!
//! The deployment does not offer history; the trait exists so descriptors and
//! the system profile can name an implementation (see [`crate::stubs::HistoryStub`]).

use async_trait::async_trait;

use crate::error::FhirResult;
use crate::search::SearchResult;

/// Request for instance, type or system history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRequest {
    /// The resource type, or `None` for system history.
    pub resource_type: Option<String>,
    /// The resource id, for instance history.
    pub id: Option<String>,
    /// Raw query parameters.
    pub query_params: Vec<(String, String)>,
    /// Base URL used to build `fullUrl` values.
    pub base_url: String,
    /// Tenant suffix from the request context (may be empty).
    pub tenant_id: String,
}

/// Response of a history call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryResponse {
    /// The result page.
    pub result: SearchResult,
}

/// Version history over stored resources.
#[async_trait]
pub trait History: Send + Sync {
    /// Returns a short name identifying this implementation.
    fn name(&self) -> &'static str;

    /// History of one resource.
    async fn instance_history(&self, request: &HistoryRequest) -> FhirResult<HistoryResponse>;

    /// History of all resources of one type.
    async fn type_history(&self, request: &HistoryRequest) -> FhirResult<HistoryResponse>;

    /// History of all resources.
    async fn system_history(&self, request: &HistoryRequest) -> FhirResult<HistoryResponse>;
}
