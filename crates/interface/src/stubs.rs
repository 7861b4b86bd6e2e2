//! Stand-ins for capabilities the deployment does not provide.
//!
//! - [`PassThroughAuthz`] allows every request (local and offline use).
//! - [`HistoryStub`] and [`SearchStub`] reject every call with `NotImplemented`.

use async_trait::async_trait;

use crate::authorization::{Authorization, AuthorizationBundleRequest, AuthorizationRequest, Claims};
use crate::error::{FhirError, FhirResult};
use crate::history::{History, HistoryRequest, HistoryResponse};
use crate::search::{GlobalSearchRequest, Search, SearchResponse, TypeSearchRequest};

/// Authorization that allows everything and reports no claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughAuthz;

#[async_trait]
impl Authorization for PassThroughAuthz {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    async fn verify_access_token(&self, _request: &AuthorizationRequest) -> FhirResult<Claims> {
        Ok(Claims::new())
    }

    async fn is_bundle_request_authorized(
        &self,
        _request: &AuthorizationBundleRequest,
    ) -> FhirResult<()> {
        Ok(())
    }

    async fn is_export_authorized(&self, _claims: &Claims) -> FhirResult<()> {
        Ok(())
    }
}

/// History that is not implemented.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryStub;

#[async_trait]
impl History for HistoryStub {
    fn name(&self) -> &'static str {
        "history-stub"
    }

    async fn instance_history(&self, _request: &HistoryRequest) -> FhirResult<HistoryResponse> {
        Err(FhirError::NotImplemented("instance history".to_string()))
    }

    async fn type_history(&self, _request: &HistoryRequest) -> FhirResult<HistoryResponse> {
        Err(FhirError::NotImplemented("type history".to_string()))
    }

    async fn system_history(&self, _request: &HistoryRequest) -> FhirResult<HistoryResponse> {
        Err(FhirError::NotImplemented("system history".to_string()))
    }
}

/// Search that is not implemented.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStub;

#[async_trait]
impl Search for SearchStub {
    fn name(&self) -> &'static str {
        "search-stub"
    }

    async fn type_search(&self, _request: &TypeSearchRequest) -> FhirResult<SearchResponse> {
        Err(FhirError::NotImplemented("type search".to_string()))
    }

    async fn global_search(&self, _request: &GlobalSearchRequest) -> FhirResult<SearchResponse> {
        Err(FhirError::NotImplemented("system search".to_string()))
    }
}
