use async_trait::async_trait;
use fhircloud_interface::{
    Authorization, AuthorizationBundleRequest, AuthorizationRequest, Claims, FhirError,
    FhirResult, FhirVersion, Operation, base_resources,
};
use tracing::{debug, warn};

use crate::rules::{RbacConfig, SUPPORTED_RULES_VERSION};
use crate::token::{decode_claims, groups};

/// Authorization driven by a group rule table.
#[derive(Debug, Clone)]
pub struct RbacHandler {
    rules: RbacConfig,
    fhir_version: FhirVersion,
}

impl RbacHandler {
    /// Creates a handler, rejecting rule tables of an unsupported version.
    pub fn new(rules: RbacConfig, fhir_version: FhirVersion) -> FhirResult<Self> {
        if rules.version != SUPPORTED_RULES_VERSION {
            return Err(FhirError::InvalidResource(format!(
                "configuration version does not match handler version: {} != {}",
                rules.version, SUPPORTED_RULES_VERSION
            )));
        }
        Ok(Self {
            rules,
            fhir_version,
        })
    }

    pub fn fhir_version(&self) -> FhirVersion {
        self.fhir_version
    }

    fn is_allowed(
        &self,
        groups: &[&str],
        operation: Operation,
        resource_type: Option<&str>,
    ) -> bool {
        groups.iter().any(|group| {
            self.rules
                .group_rules
                .get(*group)
                .is_some_and(|rule| rule.allows(operation, resource_type))
        })
    }

    fn check(
        &self,
        claims: &Claims,
        operation: Operation,
        resource_type: Option<&str>,
    ) -> FhirResult<()> {
        let groups = groups(claims);
        if self.is_allowed(&groups, operation, resource_type) {
            return Ok(());
        }

        warn!(
            operation = %operation,
            resource_type = resource_type.unwrap_or_default(),
            "Access denied"
        );
        Err(FhirError::Unauthorized(match resource_type {
            Some(t) => format!("{operation} on {t} is not allowed"),
            None => format!("{operation} is not allowed"),
        }))
    }
}

#[async_trait]
impl Authorization for RbacHandler {
    fn name(&self) -> &'static str {
        "rbac"
    }

    async fn verify_access_token(&self, request: &AuthorizationRequest) -> FhirResult<Claims> {
        let claims = decode_claims(&request.access_token)?;
        debug!(operation = %request.operation, "Verifying access token");
        self.check(&claims, request.operation, request.resource_type.as_deref())?;
        Ok(claims)
    }

    async fn is_bundle_request_authorized(
        &self,
        request: &AuthorizationBundleRequest,
    ) -> FhirResult<()> {
        for entry in &request.requests {
            self.check(&request.claims, entry.operation, Some(&entry.resource_type))?;
        }
        Ok(())
    }

    async fn is_export_authorized(&self, claims: &Claims) -> FhirResult<()> {
        let groups = groups(claims);
        let resources = base_resources(self.fhir_version);

        let allowed = groups.iter().any(|group| {
            self.rules.group_rules.get(*group).is_some_and(|rule| {
                resources
                    .iter()
                    .all(|resource| rule.allows(Operation::Read, Some(*resource)))
            })
        });

        if allowed {
            Ok(())
        } else {
            warn!("Export denied");
            Err(FhirError::Unauthorized(
                "system export requires read access to every resource type".to_string(),
            ))
        }
    }
}
