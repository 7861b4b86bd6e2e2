//! Error types for the FHIR router.
//!
//! Collaborator failures are mapped to HTTP status codes and rendered as
//! FHIR OperationOutcome responses:
//!
//! | FhirError | HTTP Status | FHIR Issue Code |
//! |-----------|-------------|-----------------|
//! | ResourceNotFound | 404 | not-found |
//! | ResourceVersionNotFound | 404 | not-found |
//! | InvalidResource | 400 | invalid |
//! | Unauthorized | 401 | login |
//! | TooManyConcurrentExports | 429 | throttled |
//! | NotImplemented | 501 | not-supported |
//! | Backend | 500 | exception |

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fhircloud_interface::FhirError;
use tracing::error;

/// The error type for router operations.
#[derive(Debug)]
pub enum RestError {
    /// Resource not found (HTTP 404).
    NotFound { resource_type: String, id: String },

    /// Version not found for vread (HTTP 404).
    VersionNotFound {
        resource_type: String,
        id: String,
        version_id: String,
    },

    /// The resource type is not served (HTTP 404).
    UnsupportedResourceType { resource_type: String },

    /// Bad request (HTTP 400).
    BadRequest { message: String },

    /// Missing or insufficient credentials (HTTP 401).
    Unauthorized { message: String },

    /// The interaction is not enabled for the target (HTTP 405).
    MethodNotAllowed { operation: String, target: String },

    /// Too many concurrent requests (HTTP 429).
    TooManyRequests { message: String },

    /// Not implemented (HTTP 501).
    NotImplemented { feature: String },

    /// Internal server error (HTTP 500).
    InternalError { message: String },
}

/// Result alias for handlers.
pub type RestResult<T> = Result<T, RestError>;

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::NotFound { resource_type, id } => {
                write!(f, "Resource not found: {}/{}", resource_type, id)
            }
            RestError::VersionNotFound {
                resource_type,
                id,
                version_id,
            } => write!(
                f,
                "Version not found: {}/{}/_history/{}",
                resource_type, id, version_id
            ),
            RestError::UnsupportedResourceType { resource_type } => {
                write!(f, "Unsupported resource type: {}", resource_type)
            }
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
            RestError::MethodNotAllowed { operation, target } => {
                write!(f, "Operation {} not allowed on {}", operation, target)
            }
            RestError::TooManyRequests { message } => write!(f, "Too many requests: {}", message),
            RestError::NotImplemented { feature } => write!(f, "Not implemented: {}", feature),
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            RestError::NotFound { resource_type, id } => (
                StatusCode::NOT_FOUND,
                "not-found",
                format!("Resource {}/{} is not known", resource_type, id),
            ),
            RestError::VersionNotFound {
                resource_type,
                id,
                version_id,
            } => (
                StatusCode::NOT_FOUND,
                "not-found",
                format!(
                    "Version \"{}\" of resource {}/{} is not known",
                    version_id, resource_type, id
                ),
            ),
            RestError::UnsupportedResourceType { resource_type } => (
                StatusCode::NOT_FOUND,
                "not-supported",
                format!("Resource type {} is not supported", resource_type),
            ),
            RestError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "invalid", message.clone())
            }
            RestError::Unauthorized { message } => {
                (StatusCode::UNAUTHORIZED, "login", message.clone())
            }
            RestError::MethodNotAllowed { operation, target } => (
                StatusCode::METHOD_NOT_ALLOWED,
                "not-supported",
                format!("Operation {} is not allowed on {}", operation, target),
            ),
            RestError::TooManyRequests { message } => {
                (StatusCode::TOO_MANY_REQUESTS, "throttled", message.clone())
            }
            RestError::NotImplemented { feature } => (
                StatusCode::NOT_IMPLEMENTED,
                "not-supported",
                format!("Feature '{}' is not implemented", feature),
            ),
            RestError::InternalError { message } => {
                error!(error = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "exception",
                    "Internal server error".to_string(),
                )
            }
        };

        let operation_outcome = create_operation_outcome("error", code, &details);
        (status, Json(operation_outcome)).into_response()
    }
}

/// Creates a FHIR OperationOutcome resource with a single issue.
pub fn create_operation_outcome(severity: &str, code: &str, details: &str) -> serde_json::Value {
    serde_json::json!({
        "resourceType": "OperationOutcome",
        "issue": [{
            "severity": severity,
            "code": code,
            "details": {
                "text": details
            }
        }]
    })
}

impl From<FhirError> for RestError {
    fn from(err: FhirError) -> Self {
        match err {
            FhirError::ResourceNotFound { resource_type, id } => {
                RestError::NotFound { resource_type, id }
            }
            FhirError::ResourceVersionNotFound {
                resource_type,
                id,
                vid,
            } => RestError::VersionNotFound {
                resource_type,
                id,
                version_id: vid,
            },
            FhirError::InvalidResource(message) => RestError::BadRequest { message },
            FhirError::Unauthorized(message) => RestError::Unauthorized { message },
            e @ FhirError::TooManyConcurrentExports => RestError::TooManyRequests {
                message: e.to_string(),
            },
            FhirError::NotImplemented(feature) => RestError::NotImplemented { feature },
            e @ FhirError::Backend { .. } => RestError::InternalError {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fhir_error_status_mapping() {
        let cases = [
            (FhirError::not_found("Patient", "1"), StatusCode::NOT_FOUND),
            (
                FhirError::InvalidResource("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                FhirError::Unauthorized("no".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                FhirError::TooManyConcurrentExports,
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                FhirError::NotImplemented("history".to_string()),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (
                FhirError::backend("dynamodb", "boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = RestError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_operation_outcome_shape() {
        let outcome = create_operation_outcome("error", "not-found", "gone");
        assert_eq!(outcome["resourceType"], "OperationOutcome");
        assert_eq!(outcome["issue"][0]["code"], "not-found");
        assert_eq!(outcome["issue"][0]["details"]["text"], "gone");
    }

    #[test]
    fn test_display() {
        let err = RestError::MethodNotAllowed {
            operation: "delete".to_string(),
            target: "Patient".to_string(),
        };
        assert_eq!(err.to_string(), "Operation delete not allowed on Patient");
    }
}
