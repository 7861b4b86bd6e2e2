//! Server configuration model.
//!
//! A [`FhirConfig`] is assembled once at process start and shared read-only
//! for the lifetime of the process. Collaborators are held as
//! `Arc<dyn Trait>` so one implementation can back many resource types.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::authorization::Authorization;
use crate::bulk_data::BulkDataAccess;
use crate::bundle::Bundle;
use crate::fhir_version::FhirVersion;
use crate::history::History;
use crate::operation::{Operation, SystemOperation};
use crate::persistence::Persistence;
use crate::search::Search;

/// Capabilities of a single resource type.
#[derive(Clone)]
pub struct ResourceDescriptor {
    /// Operations enabled for the type.
    pub operations: Vec<Operation>,
    /// Protocol versions the type is served for.
    pub fhir_versions: Vec<FhirVersion>,
    /// Backing persistence.
    pub persistence: Arc<dyn Persistence>,
    /// Type-level search.
    pub type_search: Arc<dyn Search>,
    /// Type-level history.
    pub type_history: Arc<dyn History>,
}

impl ResourceDescriptor {
    /// Returns true when the operation is enabled.
    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Returns true when the type is served for the given version.
    pub fn supports_version(&self, version: FhirVersion) -> bool {
        self.fhir_versions.contains(&version)
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("operations", &self.operations)
            .field("fhir_versions", &self.fhir_versions)
            .field("persistence", &self.persistence.name())
            .field("type_search", &self.type_search.name())
            .field("type_history", &self.type_history.name())
            .finish()
    }
}

/// Product metadata advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    /// Name of the organization operating the server.
    pub org_name: String,
}

/// Authentication service advertised in the capability statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthService {
    /// OAuth 2.0.
    OAuth,
}

/// OAuth endpoints advertised in the capability statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthPolicy {
    /// The `authorize` endpoint.
    pub authorization_endpoint: String,
    /// The `token` endpoint.
    pub token_endpoint: String,
}

/// How clients authenticate; used only when describing the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStrategy {
    /// The advertised service.
    pub service: AuthService,
    /// OAuth endpoints, when the service is OAuth based.
    pub oauth_policy: Option<OAuthPolicy>,
}

/// Authorization settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// The authorization implementation applied to every request.
    pub authorization: Arc<dyn Authorization>,
    /// The advertised strategy.
    pub strategy: AuthStrategy,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("authorization", &self.authorization.name())
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Base URL used in `fullUrl`, `Location` and bundle links.
    pub url: String,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default log level (error, warn, info, debug, trace).
    pub level: String,
}

/// System-level capabilities and the per-type resource map.
#[derive(Clone)]
pub struct Profile {
    /// Enabled system operations.
    pub system_operations: Vec<SystemOperation>,
    /// Transaction processing.
    pub bundle: Arc<dyn Bundle>,
    /// System-level history.
    pub system_history: Arc<dyn History>,
    /// System-level search.
    pub system_search: Arc<dyn Search>,
    /// Bulk export job management, when `$export` is offered.
    pub bulk_data_access: Option<Arc<dyn BulkDataAccess>>,
    /// The protocol version served.
    pub fhir_version: FhirVersion,
    /// Descriptor applied to generic resource types without an explicit entry.
    pub generic_resource: Option<ResourceDescriptor>,
    /// Explicitly configured resource types.
    pub resources: BTreeMap<String, ResourceDescriptor>,
}

impl Profile {
    /// Returns true when the system operation is enabled.
    pub fn supports(&self, operation: SystemOperation) -> bool {
        self.system_operations.contains(&operation)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("system_operations", &self.system_operations)
            .field("bundle", &self.bundle.name())
            .field("system_history", &self.system_history.name())
            .field("system_search", &self.system_search.name())
            .field("bulk_data_access", &self.bulk_data_access.is_some())
            .field("fhir_version", &self.fhir_version)
            .field("generic_resource", &self.generic_resource)
            .field("resources", &self.resources)
            .finish()
    }
}

/// Root configuration consumed by the router.
#[derive(Debug, Clone)]
pub struct FhirConfig {
    /// Version of the configuration format.
    pub config_version: f64,
    /// Product metadata.
    pub product_info: ProductInfo,
    /// Authorization settings.
    pub auth: AuthConfig,
    /// Server settings.
    pub server: ServerInfo,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Capabilities.
    pub profile: Profile,
}

impl FhirConfig {
    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server.url.trim_end_matches('/')
    }
}
