//! # fhircloud-deployment
//!
//! Serverless deployment of the FHIR API:
//!
//! - [`settings`] - environment settings with the offline fallbacks
//! - [`fhir_config`] - assembly of the [`FhirConfig`](fhircloud_interface::FhirConfig)
//!   from the connected services
//! - [`rbac_rules`] - the group rule table
//! - [`adapter`] - conversion between Lambda proxy events and router requests
//! - [`logging`] - subscriber setup for the Lambda environment

pub mod adapter;
pub mod error;
pub mod fhir_config;
pub mod logging;
pub mod rbac_rules;
pub mod settings;

pub use adapter::{InvocationContext, InvocationEvent, ProxyResponse, ServerlessAdapter};
pub use error::{AdapterError, ConfigError};
pub use fhir_config::{Services, assemble_fhir_config, generic_resources};
pub use logging::init_logging;
pub use rbac_rules::rbac_rules;
pub use settings::{AdapterVariant, DeploymentSettings, env_or_default};
