use std::time::Duration;

use elasticsearch::Elasticsearch;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use fhircloud_interface::{FhirError, FhirResult};

pub(crate) const SERVICE: &str = "elasticsearch";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds a client for a single cluster endpoint.
pub fn build_client(endpoint: &str) -> FhirResult<Elasticsearch> {
    let url: elasticsearch::http::Url = endpoint
        .parse()
        .map_err(|e| FhirError::backend(SERVICE, format!("invalid endpoint {endpoint}: {e}")))?;

    let pool = SingleNodeConnectionPool::new(url);
    let transport = TransportBuilder::new(pool)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| FhirError::backend(SERVICE, format!("failed to build transport: {e}")))?;

    Ok(Elasticsearch::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint() {
        let err = build_client("not a url").unwrap_err();
        assert!(matches!(err, FhirError::Backend { service, .. } if service == "elasticsearch"));
    }

    #[test]
    fn test_valid_endpoint() {
        assert!(build_client("https://fake-es-endpoint.com").is_ok());
    }
}
