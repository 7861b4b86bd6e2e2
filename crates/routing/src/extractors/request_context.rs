use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use fhircloud_interface::RequestContext;

/// The [`RequestContext`] attached by the serverless adapter.
///
/// Requests that did not come through the adapter get the default context,
/// which has no tenant.
#[derive(Debug, Clone, Default)]
pub struct RequestContextExtractor(pub RequestContext);

impl RequestContextExtractor {
    pub fn tenant_id(&self) -> &str {
        &self.0.tenant_id
    }
}

impl<S> FromRequestParts<S> for RequestContextExtractor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContextExtractor(
            parts
                .extensions
                .get::<RequestContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}
