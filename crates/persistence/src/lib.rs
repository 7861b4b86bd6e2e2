//! # fhircloud-persistence
//!
//! AWS backed collaborators for the FHIR Cloud deployment:
//!
//! - [`DynamoDbDataService`] reads versioned resources and manages bulk export jobs
//! - [`DynamoDbBundleService`] applies transaction bundles atomically
//! - [`S3DataService`] serves `Binary` payloads from an object store
//!
//! All DynamoDB access goes through the [`DynamoDbApi`] trait so services can
//! be exercised without a live table.

pub mod bulk_export;
pub mod bundle_service;
pub mod clean;
pub mod data_service;
pub mod document_status;
pub mod dynamodb;
pub mod s3_data_service;

mod error;

pub use bulk_export::MAX_CONCURRENT_EXPORT_JOBS;
pub use bundle_service::{DynamoDbBundleService, MAX_BUNDLE_ENTRIES};
pub use clean::clean_item;
pub use data_service::DynamoDbDataService;
pub use document_status::DocumentStatus;
pub use dynamodb::{AwsDynamoDbClient, DynamoDbApi, DynamoDbClientError};
pub use s3_data_service::{S3DataService, build_binary_store};
