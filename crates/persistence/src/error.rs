//! Mapping of backend client failures onto [`FhirError`].

use fhircloud_interface::FhirError;

use crate::dynamodb::DynamoDbClientError;

pub(crate) const DYNAMODB: &str = "dynamodb";
pub(crate) const OBJECT_STORE: &str = "s3";

impl From<DynamoDbClientError> for FhirError {
    fn from(err: DynamoDbClientError) -> Self {
        match err {
            DynamoDbClientError::ConditionalCheckFailed => {
                FhirError::InvalidResource("conditional check failed".to_string())
            }
            DynamoDbClientError::TransactionCanceled(message) => {
                FhirError::InvalidResource(format!("transaction was canceled: {message}"))
            }
            DynamoDbClientError::InvalidInput(message) => FhirError::InvalidResource(message),
            DynamoDbClientError::Throttled(message)
            | DynamoDbClientError::Unavailable(message)
            | DynamoDbClientError::Internal(message) => FhirError::backend(DYNAMODB, message),
        }
    }
}

pub(crate) fn object_store_error(err: object_store::Error) -> FhirError {
    FhirError::backend(OBJECT_STORE, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttling_is_a_backend_error() {
        let err: FhirError = DynamoDbClientError::Throttled("slow down".to_string()).into();
        assert_eq!(
            err,
            FhirError::Backend {
                service: "dynamodb".to_string(),
                message: "slow down".to_string()
            }
        );
    }

    #[test]
    fn test_canceled_transaction_is_invalid() {
        let err: FhirError = DynamoDbClientError::TransactionCanceled("dup".to_string()).into();
        assert!(matches!(err, FhirError::InvalidResource(_)));
    }
}
