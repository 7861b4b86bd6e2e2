//! Error types for configuration assembly and the request adapter.

use fhircloud_interface::FhirError;
use thiserror::Error;

/// Failures while building the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds an invalid value.
    #[error("invalid settings: {0}")]
    Settings(#[source] clap::Error),

    /// The RBAC rule table was rejected.
    #[error("invalid RBAC rules: {0}")]
    RbacRules(#[source] FhirError),

    /// A backing service client could not be created.
    #[error("failed to connect to {service}: {source}")]
    Connect {
        service: &'static str,
        #[source]
        source: FhirError,
    },
}

/// Failures while adapting an invocation to the router.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The invocation payload is not a proxy event.
    #[error("invalid invocation event: {0}")]
    Event(#[from] serde_json::Error),

    /// The event does not form a valid HTTP request.
    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    /// The event body is flagged base64 but does not decode.
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The router response body could not be collected.
    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),
}
