//! Assembly of the server configuration.
//!
//! The configuration is built once per process from the settings and the
//! connected [`Services`]:
//!
//! - 21 clinical types share one descriptor allowing `read` and `search-type`,
//!   backed by DynamoDB and Elasticsearch.
//! - `Binary` allows `read` only, with payloads served from S3.
//! - The only system operation is `transaction`.
//! - Authorization is RBAC unless running offline.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use fhircloud_authz::RbacHandler;
use fhircloud_interface::stubs::{HistoryStub, PassThroughAuthz, SearchStub};
use fhircloud_interface::{
    AuthConfig, AuthService, AuthStrategy, Authorization, BASE_R4_RESOURCES, BulkDataAccess,
    FhirConfig,
    FhirVersion, LoggingConfig, OAuthPolicy, Operation, ProductInfo, Profile, ResourceDescriptor,
    Search, SearchFilter, ServerInfo, SystemOperation, base_resources,
};
use fhircloud_persistence::{
    AwsDynamoDbClient, DocumentStatus, DynamoDbApi, DynamoDbBundleService, DynamoDbDataService,
    S3DataService, build_binary_store, clean_item,
};
use fhircloud_search::{ElasticSearchService, build_client};
use object_store::ObjectStore;
use tracing::info;

use crate::error::ConfigError;
use crate::rbac_rules::rbac_rules;
use crate::settings::DeploymentSettings;

/// The protocol version served.
pub const FHIR_VERSION: FhirVersion = FhirVersion::R4;

/// Version of the configuration format.
pub const CONFIG_VERSION: f64 = 1.0;

/// Advertised organization name.
pub const ORG_NAME: &str = "Organization Name";

/// Default log level.
pub const LOG_LEVEL: &str = "error";

/// Types served with read and type search.
pub const SUPPORTED_RESOURCES: &[&str] = &[
    "AllergyIntolerance",
    "CarePlan",
    "CareTeam",
    "Condition",
    "Demographics",
    "Device",
    "DiagnosticReport",
    "DocumentReference",
    "Encounter",
    "Goal",
    "Immunizations",
    "Location",
    "Medication",
    "MedicationRequest",
    "Observation",
    "Organization",
    "Patient",
    "Practitioner",
    "PractitionerRole",
    "Procedure",
    "Provenance",
];

/// Generic resource list handed to the router.
pub fn generic_resources() -> &'static [&'static str] {
    base_resources(FHIR_VERSION)
}

/// Connected backing services.
pub struct Services {
    pub data_service: Arc<DynamoDbDataService>,
    pub bundle_service: Arc<DynamoDbBundleService>,
    pub search: Arc<dyn Search>,
    pub binary_store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("data_service", &self.data_service)
            .field("bundle_service", &self.bundle_service)
            .field("search", &self.search.name())
            .finish_non_exhaustive()
    }
}

impl Services {
    /// Creates the AWS and Elasticsearch clients named by the settings.
    pub async fn connect(settings: &DeploymentSettings) -> Result<Self, ConfigError> {
        info!(
            region = %settings.aws_region,
            resource_table = %settings.resource_table,
            export_table = %settings.export_request_table,
            "Connecting backing services"
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.aws_region.clone()))
            .load()
            .await;
        let dynamodb: Arc<dyn DynamoDbApi> =
            Arc::new(AwsDynamoDbClient::from_sdk_config(&sdk_config));

        let es_client = build_client(&settings.elasticsearch_domain_endpoint).map_err(|source| {
            ConfigError::Connect {
                service: "elasticsearch",
                source,
            }
        })?;
        let search = Arc::new(ElasticSearchService::new(
            es_client,
            search_filters(),
            clean_item,
            FHIR_VERSION,
        ));

        let binary_store = build_binary_store(&settings.fhir_binary_bucket, &settings.aws_region)
            .map_err(|source| ConfigError::Connect {
                service: "s3",
                source,
            })?;

        Ok(Self::from_parts(settings, dynamodb, search, binary_store))
    }

    /// Wires the services over already constructed clients.
    pub fn from_parts(
        settings: &DeploymentSettings,
        dynamodb: Arc<dyn DynamoDbApi>,
        search: Arc<dyn Search>,
        binary_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            data_service: Arc::new(DynamoDbDataService::new(
                Arc::clone(&dynamodb),
                &settings.resource_table,
                &settings.export_request_table,
            )),
            bundle_service: Arc::new(DynamoDbBundleService::new(
                dynamodb,
                &settings.resource_table,
            )),
            search,
            binary_store,
        }
    }
}

/// Filters applied to every search: only available documents.
pub fn search_filters() -> Vec<SearchFilter> {
    vec![SearchFilter::must_equal(
        "documentStatus",
        &[DocumentStatus::Available.as_str()],
    )]
}

fn authorization(settings: &DeploymentSettings) -> Result<Arc<dyn Authorization>, ConfigError> {
    if settings.is_offline() {
        info!("Running offline, authorization disabled");
        return Ok(Arc::new(PassThroughAuthz));
    }

    let handler =
        RbacHandler::new(rbac_rules(BASE_R4_RESOURCES), FHIR_VERSION).map_err(ConfigError::RbacRules)?;
    Ok(Arc::new(handler))
}

/// Builds the server configuration.
pub fn assemble_fhir_config(
    settings: &DeploymentSettings,
    services: &Services,
) -> Result<FhirConfig, ConfigError> {
    let oauth_url = settings.oauth_url();

    let supported = ResourceDescriptor {
        operations: vec![Operation::Read, Operation::SearchType],
        fhir_versions: vec![FHIR_VERSION],
        persistence: services.data_service.clone(),
        type_search: Arc::clone(&services.search),
        type_history: Arc::new(HistoryStub),
    };

    let mut resources: BTreeMap<String, ResourceDescriptor> = SUPPORTED_RESOURCES
        .iter()
        .map(|name| (name.to_string(), supported.clone()))
        .collect();
    resources.insert(
        "Binary".to_string(),
        ResourceDescriptor {
            operations: vec![Operation::Read],
            fhir_versions: vec![FHIR_VERSION],
            persistence: Arc::new(S3DataService::new(
                services.data_service.clone(),
                Arc::clone(&services.binary_store),
            )),
            type_search: Arc::new(SearchStub),
            type_history: Arc::new(HistoryStub),
        },
    );

    let config = FhirConfig {
        config_version: CONFIG_VERSION,
        product_info: ProductInfo {
            org_name: ORG_NAME.to_string(),
        },
        auth: AuthConfig {
            authorization: authorization(settings)?,
            strategy: AuthStrategy {
                service: AuthService::OAuth,
                oauth_policy: Some(OAuthPolicy {
                    authorization_endpoint: format!("{}/authorize", oauth_url),
                    token_endpoint: format!("{}/token", oauth_url),
                }),
            },
        },
        server: ServerInfo {
            url: settings.api_url(),
        },
        logging: LoggingConfig {
            level: LOG_LEVEL.to_string(),
        },
        profile: Profile {
            system_operations: vec![SystemOperation::Transaction],
            bundle: services.bundle_service.clone(),
            system_history: Arc::new(HistoryStub),
            system_search: Arc::new(SearchStub),
            bulk_data_access: Some(services.data_service.clone() as Arc<dyn BulkDataAccess>),
            fhir_version: FHIR_VERSION,
            generic_resource: None,
            resources,
        },
    };

    info!(
        server_url = %config.server.url,
        resources = config.profile.resources.len(),
        authorization = config.auth.authorization.name(),
        "Assembled FHIR configuration"
    );
    Ok(config)
}
