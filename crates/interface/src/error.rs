//! Error type shared by every collaborator.
//!
//! Collaborators report failures with [`FhirError`]; the router maps each
//! variant onto an HTTP status and an OperationOutcome issue code.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The error type returned by all collaborator operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FhirError {
    /// The requested resource does not exist (or has been deleted).
    #[error("resource {resource_type}/{id} is not known")]
    ResourceNotFound { resource_type: String, id: String },

    /// The requested version of a resource does not exist.
    #[error("version \"{vid}\" of resource {resource_type}/{id} is not known")]
    ResourceVersionNotFound {
        resource_type: String,
        id: String,
        vid: String,
    },

    /// The request or resource content is invalid.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// The caller is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A new bulk export was requested while the concurrency limit is reached.
    #[error("there is currently too many requests, please try again later")]
    TooManyConcurrentExports,

    /// The capability is not provided by this deployment.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A downstream service (database, search cluster, object store) failed.
    #[error("{service} error: {message}")]
    Backend { service: String, message: String },
}

impl FhirError {
    /// Creates a [`FhirError::ResourceNotFound`].
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        FhirError::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates a [`FhirError::Backend`] for the named service.
    pub fn backend(service: &str, message: impl ToString) -> Self {
        FhirError::Backend {
            service: service.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result alias for collaborator operations.
pub type FhirResult<T> = Result<T, FhirError>;
