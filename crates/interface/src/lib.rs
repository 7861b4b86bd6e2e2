//! # fhircloud-interface - Shared FHIR Server Contracts
//!
//! This crate defines the contracts that the FHIR Cloud deployment composes:
//! the server configuration model, the traits every collaborator implements,
//! stub implementations for capabilities that are not provided, and the base
//! resource lists for each supported FHIR version.
//!
//! ## Collaborators
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`Persistence`] | Reading resources from the document store |
//! | [`Search`] | Type-level and system-level search |
//! | [`History`] | Type-level and system-level history |
//! | [`Bundle`] | Transaction bundle processing |
//! | [`Authorization`] | Access token verification and bundle authorization |
//! | [`BulkDataAccess`] | Bulk export job management |
//!
//! All traits are object safe and `Send + Sync`, so a [`FhirConfig`] holds
//! them as `Arc<dyn Trait>` and can be shared read-only across invocations.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fhircloud_interface::{FhirVersion, Operation, stubs};
//!
//! let history = Arc::new(stubs::HistoryStub);
//! assert_eq!(FhirVersion::R4.as_str(), "4.0.1");
//! assert_eq!(Operation::SearchType.as_str(), "search-type");
//! # let _ = history;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod authorization;
pub mod bulk_data;
pub mod bundle;
pub mod config;
pub mod error;
pub mod fhir_version;
pub mod history;
pub mod operation;
pub mod persistence;
pub mod request_context;
pub mod resources;
pub mod search;
pub mod stubs;

pub use authorization::{AuthorizationBundleRequest, AuthorizationRequest, Authorization, Claims};
pub use bulk_data::{
    BulkDataAccess, ExportJobStatus, ExportType, GetExportStatusResponse, InitiateExportRequest,
};
pub use bundle::{BatchReadWriteRequest, BatchReadWriteResponse, Bundle, BundleRequest, BundleResponse};
pub use config::{
    AuthConfig, AuthService, AuthStrategy, FhirConfig, LoggingConfig, OAuthPolicy, ProductInfo,
    Profile, ResourceDescriptor, ServerInfo,
};
pub use error::{FhirError, FhirResult};
pub use fhir_version::FhirVersion;
pub use history::{History, HistoryRequest, HistoryResponse};
pub use operation::{Operation, SystemOperation};
pub use persistence::{GenericResponse, Persistence, ReadResourceRequest, VReadResourceRequest};
pub use request_context::RequestContext;
pub use resources::{BASE_R4_RESOURCES, BASE_STU3_RESOURCES, base_resources};
pub use search::{
    ComparisonOperator, GlobalSearchRequest, ItemCleaner, LogicalOperator, Search, SearchEntry,
    SearchFilter, SearchResponse, SearchResult, TypeSearchRequest,
};
