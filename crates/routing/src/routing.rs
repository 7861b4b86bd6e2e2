//! Route configuration.

use axum::{
    Router,
    routing::get,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the FHIR routes.
///
/// ## System-level
/// - `GET /` - System search
/// - `POST /` - Transaction
/// - `GET /_history` - System history
/// - `GET /$export` - Start a bulk export
/// - `GET /$export/{job_id}` - Export status
/// - `DELETE /$export/{job_id}` - Cancel an export
///
/// ## Type-level
/// - `GET /{type}` - Search
/// - `GET /{type}/_history` - Type history
///
/// ## Instance-level
/// - `GET /{type}/{id}` - Read
/// - `GET /{type}/{id}/_history` - Instance history
/// - `GET /{type}/{id}/_history/{vid}` - Version read
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::search_system_handler).post(handlers::transaction_handler),
        )
        .route("/_history", get(handlers::history_system_handler))
        .route("/$export", get(handlers::export_handler))
        .route(
            "/$export/{job_id}",
            get(handlers::export_status_handler).delete(handlers::cancel_export_handler),
        )
        .route("/{resource_type}", get(handlers::search_type_handler))
        .route(
            "/{resource_type}/_history",
            get(handlers::history_type_handler),
        )
        .route("/{resource_type}/{id}", get(handlers::read_handler))
        .route(
            "/{resource_type}/{id}/_history",
            get(handlers::history_instance_handler),
        )
        .route(
            "/{resource_type}/{id}/_history/{version_id}",
            get(handlers::vread_handler),
        )
        .with_state(state)
}
