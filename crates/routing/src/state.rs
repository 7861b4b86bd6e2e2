//! Shared state for the FHIR router.

use std::collections::HashSet;
use std::sync::Arc;

use fhircloud_interface::{
    AuthorizationRequest, Claims, FhirConfig, Operation, Profile, ResourceDescriptor,
};
use tracing::debug;

use crate::error::{RestError, RestResult};

/// Shared application state.
///
/// Holds the assembled configuration and the set of resource types served
/// through the generic descriptor.
pub struct AppState {
    config: Arc<FhirConfig>,
    generic_resources: Arc<HashSet<String>>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            generic_resources: Arc::clone(&self.generic_resources),
        }
    }
}

impl AppState {
    pub fn new(config: Arc<FhirConfig>, generic_resources: &[&str]) -> Self {
        Self {
            config,
            generic_resources: Arc::new(generic_resources.iter().map(|r| r.to_string()).collect()),
        }
    }

    pub fn config(&self) -> &FhirConfig {
        &self.config
    }

    pub fn profile(&self) -> &Profile {
        &self.config.profile
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Resolves the descriptor serving a resource type.
    ///
    /// An explicit entry wins over the generic descriptor, which only applies
    /// to types in the generic list.
    pub fn resource(&self, resource_type: &str) -> RestResult<&ResourceDescriptor> {
        let profile = self.profile();
        if let Some(descriptor) = profile.resources.get(resource_type) {
            return Ok(descriptor);
        }

        match &profile.generic_resource {
            Some(descriptor) if self.generic_resources.contains(resource_type) => Ok(descriptor),
            _ => Err(RestError::UnsupportedResourceType {
                resource_type: resource_type.to_string(),
            }),
        }
    }

    /// Resolves a descriptor and checks that it enables `operation`.
    pub fn resource_for(
        &self,
        resource_type: &str,
        operation: Operation,
    ) -> RestResult<&ResourceDescriptor> {
        let descriptor = self.resource(resource_type)?;
        if !descriptor.supports(operation) || !descriptor.supports_version(self.profile().fhir_version)
        {
            return Err(RestError::MethodNotAllowed {
                operation: operation.to_string(),
                target: resource_type.to_string(),
            });
        }
        Ok(descriptor)
    }

    /// Verifies the access token for an operation and returns its claims.
    pub async fn authorize(
        &self,
        access_token: &str,
        operation: Operation,
        resource_type: Option<&str>,
    ) -> RestResult<Claims> {
        let authorization = &self.config.auth.authorization;
        debug!(
            authorization = authorization.name(),
            operation = %operation,
            resource_type = resource_type.unwrap_or_default(),
            "Authorizing request"
        );

        let request = AuthorizationRequest::new(access_token, operation, resource_type);
        Ok(authorization.verify_access_token(&request).await?)
    }
}
