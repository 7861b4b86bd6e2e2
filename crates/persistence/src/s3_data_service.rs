//! Binary persistence: metadata from the document store, bytes from S3.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fhircloud_interface::{
    FhirError, FhirResult, GenericResponse, Persistence, ReadResourceRequest,
    VReadResourceRequest,
};
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use serde_json::Value;
use tracing::debug;

use crate::error::{OBJECT_STORE, object_store_error};

/// Builds the object store holding Binary payloads.
///
/// Credentials are taken from the standard `AWS_*` environment variables.
pub fn build_binary_store(bucket: &str, region: &str) -> FhirResult<Arc<dyn ObjectStore>> {
    let store = AmazonS3Builder::from_env()
        .with_region(region)
        .with_bucket_name(bucket)
        .build()
        .map_err(|e| {
            FhirError::backend(OBJECT_STORE, format!("failed to configure bucket {bucket}: {e}"))
        })?;
    Ok(Arc::new(store))
}

/// Persistence decorator for `Binary`.
///
/// The wrapped service stores the Binary resource without its payload; the
/// payload lives in the object store under `{id}_{vid}.{ext}`.
pub struct S3DataService {
    inner: Arc<dyn Persistence>,
    store: Arc<dyn ObjectStore>,
}

impl S3DataService {
    pub fn new(inner: Arc<dyn Persistence>, store: Arc<dyn ObjectStore>) -> Self {
        Self { inner, store }
    }

    async fn attach_payload(&self, mut resource: Value, id: &str, vid: &str) -> FhirResult<Value> {
        let content_type = resource
            .get("contentType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let key = binary_object_key(id, vid, content_type);
        debug!(key = %key, "Fetching Binary payload");

        let result = match self.store.get(&Path::from(key.as_str())).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(FhirError::not_found("Binary", id));
            }
            Err(err) => return Err(object_store_error(err)),
        };
        let bytes = result.bytes().await.map_err(object_store_error)?;

        resource["data"] = Value::String(STANDARD.encode(&bytes));
        Ok(resource)
    }
}

impl fmt::Debug for S3DataService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3DataService")
            .field("inner", &self.inner.name())
            .field("store", &self.store.to_string())
            .finish()
    }
}

/// Object key of a Binary payload.
pub fn binary_object_key(id: &str, vid: &str, content_type: &str) -> String {
    format!("{id}_{vid}.{}", file_extension(content_type))
}

/// File extension for a MIME type, ignoring parameters.
pub fn file_extension(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let known = match essence.as_str() {
        "application/pdf" => Some("pdf"),
        "application/json" | "application/fhir+json" => Some("json"),
        "application/xml" | "text/xml" | "application/fhir+xml" => Some("xml"),
        "application/dicom" => Some("dcm"),
        "application/zip" => Some("zip"),
        "application/octet-stream" => Some("bin"),
        "text/plain" => Some("txt"),
        "text/html" => Some("html"),
        "text/csv" => Some("csv"),
        "image/jpeg" => Some("jpeg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/tiff" => Some("tiff"),
        "image/svg+xml" => Some("svg"),
        "audio/mpeg" => Some("mp3"),
        "video/mp4" => Some("mp4"),
        _ => None,
    };

    match known {
        Some(ext) => ext.to_string(),
        None => essence
            .split_once('/')
            .map(|(_, subtype)| subtype.rsplit('+').next().unwrap_or(subtype).to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "bin".to_string()),
    }
}

fn version_id(resource: &Value) -> FhirResult<String> {
    resource
        .get("meta")
        .and_then(|m| m.get("versionId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FhirError::InvalidResource("Binary is missing meta.versionId".to_string()))
}

#[async_trait]
impl Persistence for S3DataService {
    fn name(&self) -> &'static str {
        "s3-binary"
    }

    async fn read_resource(&self, request: &ReadResourceRequest) -> FhirResult<GenericResponse> {
        let response = self.inner.read_resource(request).await?;
        let vid = version_id(&response.resource)?;
        let resource = self.attach_payload(response.resource, &request.id, &vid).await?;

        Ok(GenericResponse {
            message: response.message,
            resource,
        })
    }

    async fn vread_resource(
        &self,
        request: &VReadResourceRequest,
    ) -> FhirResult<GenericResponse> {
        let response = self.inner.vread_resource(request).await?;
        let resource = self
            .attach_payload(response.resource, &request.id, &request.vid)
            .await?;

        Ok(GenericResponse {
            message: response.message,
            resource,
        })
    }
}
