//! # fhircloud-routing - FHIR REST Router
//!
//! Turns an assembled [`FhirConfig`] into an axum [`Router`] serving the FHIR
//! interactions each resource type enables.
//!
//! ## Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | read | GET | `/[type]/[id]` |
//! | vread | GET | `/[type]/[id]/_history/[vid]` |
//! | search (type) | GET | `/[type]?params` |
//! | history (instance) | GET | `/[type]/[id]/_history` |
//! | history (type) | GET | `/[type]/_history` |
//! | search (system) | GET | `/?params` |
//! | history (system) | GET | `/_history` |
//! | transaction | POST | `/` |
//! | bulk export | GET | `/$export` |
//! | export status | GET | `/$export/[jobId]` |
//! | cancel export | DELETE | `/$export/[jobId]` |
//!
//! ## Request Processing
//!
//! Every request is authorized first using the bearer token from the
//! `Authorization` header (empty when absent). The resource type is then
//! resolved: an explicit entry in `profile.resources` wins, otherwise the
//! generic descriptor applies to types in the generic resource list.
//! Unknown types answer 404 and operations a descriptor does not enable
//! answer 405.
//!
//! The tenant comes from the [`RequestContext`](fhircloud_interface::RequestContext)
//! extension attached by the serverless adapter.
//!
//! ## Error Handling
//!
//! All errors are returned as FHIR OperationOutcome resources; see [`error`].

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod state;

pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use fhircloud_interface::FhirConfig;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the router for a configuration.
///
/// `generic_resources` lists the types served through
/// `profile.generic_resource` when they have no explicit entry.
pub fn generate_router(config: Arc<FhirConfig>, generic_resources: &[&str]) -> Router {
    info!(
        base_url = %config.base_url(),
        fhir_version = %config.profile.fhir_version,
        resources = config.profile.resources.len(),
        authorization = config.auth.authorization.name(),
        "Creating FHIR router"
    );

    let state = AppState::new(config, generic_resources);
    routing::create_routes(state).layer(TraceLayer::new_for_http())
}
