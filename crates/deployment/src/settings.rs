//! Deployment settings read from the Lambda environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IS_OFFLINE` | unset | Non-empty value disables authorization |
//! | `API_URL` | `https://API_URL.com` | Server base URL |
//! | `OAUTH2_DOMAIN_ENDPOINT` | `https://OAUTH2.com` | OAuth base URL |
//! | `TRACKING_ID_KEY` | `tracking-Id` | Correlation header |
//! | `ADAPTER_VARIANT` | `tenant-proxy` | `tenant-proxy` or `tracking-log` |
//! | `RESOURCE_TABLE` | `resource-db-dev` | DynamoDB resource table |
//! | `EXPORT_REQUEST_TABLE` | `export-request-dev` | DynamoDB export job table |
//! | `ELASTICSEARCH_DOMAIN_ENDPOINT` | `https://fake-es-endpoint.com` | Search cluster |
//! | `FHIR_BINARY_BUCKET` | `fhir-binary-dev` | Binary payload bucket |
//! | `AWS_REGION` | `us-west-2` | AWS region |
//!
//! When running serverless offline, unset variables can arrive as the
//! literal text `[object Object]`; [`env_or_default`] treats that as unset.

use std::ffi::OsString;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;

/// Fallback server URL.
pub const DEFAULT_API_URL: &str = "https://API_URL.com";

/// Fallback OAuth base URL.
pub const DEFAULT_OAUTH2_DOMAIN_ENDPOINT: &str = "https://OAUTH2.com";

/// Value the offline emulator substitutes for unset variables.
pub const UNSET_PLACEHOLDER: &str = "[object Object]";

/// How the adapter enriches each invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AdapterVariant {
    /// Copies the user, tenant and proxy path segment onto the request.
    #[default]
    TenantProxy,
    /// Copies the user and logs the trace id with the tracking header.
    TrackingLog,
}

/// Settings for the serverless deployment.
#[derive(Debug, Clone, Parser)]
#[command(name = "fhircloud")]
#[command(about = "Serverless FHIR API")]
pub struct DeploymentSettings {
    /// Run without authorization (serverless offline).
    #[arg(long, env = "IS_OFFLINE")]
    pub is_offline: Option<String>,

    /// Base URL of the API.
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Base URL of the OAuth 2.0 domain.
    #[arg(long, env = "OAUTH2_DOMAIN_ENDPOINT")]
    pub oauth2_domain_endpoint: Option<String>,

    /// Header carrying the caller's tracking id.
    #[arg(long, env = "TRACKING_ID_KEY", default_value = "tracking-Id")]
    pub tracking_id_key: String,

    /// Adapter variant.
    #[arg(long, env = "ADAPTER_VARIANT", value_enum, default_value = "tenant-proxy")]
    pub adapter_variant: AdapterVariant,

    /// DynamoDB table holding resource versions.
    #[arg(long, env = "RESOURCE_TABLE", default_value = "resource-db-dev")]
    pub resource_table: String,

    /// DynamoDB table holding bulk export jobs.
    #[arg(long, env = "EXPORT_REQUEST_TABLE", default_value = "export-request-dev")]
    pub export_request_table: String,

    /// Elasticsearch endpoint.
    #[arg(
        long,
        env = "ELASTICSEARCH_DOMAIN_ENDPOINT",
        default_value = "https://fake-es-endpoint.com"
    )]
    pub elasticsearch_domain_endpoint: String,

    /// Bucket holding Binary payloads.
    #[arg(long, env = "FHIR_BINARY_BUCKET", default_value = "fhir-binary-dev")]
    pub fhir_binary_bucket: String,

    /// AWS region.
    #[arg(long, env = "AWS_REGION", default_value = "us-west-2")]
    pub aws_region: String,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            is_offline: None,
            api_url: None,
            oauth2_domain_endpoint: None,
            tracking_id_key: "tracking-Id".to_string(),
            adapter_variant: AdapterVariant::TenantProxy,
            resource_table: "resource-db-dev".to_string(),
            export_request_table: "export-request-dev".to_string(),
            elasticsearch_domain_endpoint: "https://fake-es-endpoint.com".to_string(),
            fhir_binary_bucket: "fhir-binary-dev".to_string(),
            aws_region: "us-west-2".to_string(),
        }
    }
}

impl DeploymentSettings {
    /// Reads settings from the environment, ignoring command line arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(["fhircloud"])
    }

    /// Parses settings from arguments, with the environment as fallback.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ConfigError::Settings)
    }

    /// Creates settings for tests: online, no URLs set.
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Returns true when `IS_OFFLINE` is set to a non-empty value.
    pub fn is_offline(&self) -> bool {
        self.is_offline.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// The server base URL, with the fallback applied.
    pub fn api_url(&self) -> String {
        env_or_default(self.api_url.as_deref(), DEFAULT_API_URL)
    }

    /// The OAuth base URL, with the fallback applied.
    pub fn oauth_url(&self) -> String {
        env_or_default(self.oauth2_domain_endpoint.as_deref(), DEFAULT_OAUTH2_DOMAIN_ENDPOINT)
    }
}

/// Returns `value` verbatim unless it is unset or the offline placeholder.
pub fn env_or_default(value: Option<&str>, default: &str) -> String {
    match value {
        None | Some(UNSET_PLACEHOLDER) => default.to_string(),
        Some(v) => v.to_string(),
    }
}
