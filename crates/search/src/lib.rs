//! # fhircloud-search
//!
//! Type-level FHIR search over Elasticsearch. Each resource type lives in its
//! own index named after the lowercased type plus the tenant suffix.

pub mod client;
pub mod query_builder;
pub mod service;

pub use client::build_client;
pub use query_builder::{DEFAULT_PAGE_SIZE, EsQuery, MAX_PAGE_SIZE, build_search_query};
pub use service::{ElasticSearchService, index_name, parse_search_response};
