//! Serverless request adapter.
//!
//! Converts an API Gateway proxy event into an `http::Request`, attaches the
//! per-invocation [`RequestContext`], runs it through the router once and
//! converts the response back into a proxy response.

use std::collections::BTreeMap;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fhircloud_interface::RequestContext;
use lambda_runtime::LambdaEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use tracing::{debug, info};

use crate::error::AdapterError;
use crate::settings::AdapterVariant;

/// Environment variable holding the platform trace id.
pub const TRACE_ID_ENV: &str = "_X_AMZN_TRACE_ID";

/// An API Gateway proxy event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationEvent {
    pub http_method: Option<String>,
    pub path: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    pub multi_value_query_string_parameters: Option<BTreeMap<String, Vec<String>>>,
    pub path_parameters: Option<BTreeMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    /// Identity claims injected by the authorizer.
    pub user: Option<Value>,
}

impl InvocationEvent {
    /// Parses a raw payload; `null` is an empty event.
    pub fn from_payload(payload: Value) -> Result<Self, AdapterError> {
        if payload.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(payload)?)
    }

    fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// Looks up a header value ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        let single = self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        });

        single.or_else(|| {
            self.multi_value_headers.as_ref().and_then(|headers| {
                headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .and_then(|(_, v)| v.first())
                    .map(String::as_str)
            })
        })
    }
}

/// Invocation metadata supplied by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub xray_trace_id: Option<String>,
}

impl From<&lambda_runtime::Context> for InvocationContext {
    fn from(context: &lambda_runtime::Context) -> Self {
        Self {
            request_id: context.request_id.clone(),
            xray_trace_id: context.xray_trace_id.clone(),
        }
    }
}

/// An API Gateway proxy response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Collects a router response.
    ///
    /// Bodies that are not UTF-8 are base64 encoded.
    pub async fn from_response(response: Response<Body>) -> Result<Self, AdapterError> {
        let (parts, body) = response.into_parts();

        let mut headers = BTreeMap::new();
        let mut multi_value_headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &parts.headers {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers.insert(name.as_str().to_string(), value.clone());
            multi_value_headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(value);
        }

        let bytes = to_bytes(body, usize::MAX).await?;
        let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
            Ok(text) => (text, false),
            Err(_) => (BASE64.encode(&bytes), true),
        };

        Ok(Self {
            status_code: parts.status.as_u16(),
            headers,
            multi_value_headers,
            body,
            is_base64_encoded,
        })
    }
}

/// Wraps the router for Lambda invocations.
#[derive(Clone)]
pub struct ServerlessAdapter {
    router: Router,
    variant: AdapterVariant,
    tracking_id_key: String,
}

impl ServerlessAdapter {
    pub fn new(router: Router, variant: AdapterVariant, tracking_id_key: impl Into<String>) -> Self {
        Self {
            router,
            variant,
            tracking_id_key: tracking_id_key.into(),
        }
    }

    /// Entry point registered with the Lambda runtime.
    pub async fn handle_event(
        &self,
        event: LambdaEvent<Value>,
    ) -> Result<ProxyResponse, lambda_runtime::Error> {
        let context = InvocationContext::from(&event.context);
        let invocation = InvocationEvent::from_payload(event.payload)?;
        Ok(self.handle(invocation, &context).await?)
    }

    /// Adapts one invocation and returns the router's response unchanged.
    pub async fn handle(
        &self,
        event: InvocationEvent,
        context: &InvocationContext,
    ) -> Result<ProxyResponse, AdapterError> {
        let request_context = self.request_context(&event, context);
        debug!(
            request_id = %context.request_id,
            tenant = %request_context.tenant_id,
            method = event.http_method.as_deref().unwrap_or("GET"),
            "Adapting invocation"
        );

        let mut request = build_request(&event, request_context.proxy.as_deref())?;
        request.extensions_mut().insert(request_context);

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        ProxyResponse::from_response(response).await
    }

    /// Derives the request context for the configured variant.
    pub fn request_context(
        &self,
        event: &InvocationEvent,
        context: &InvocationContext,
    ) -> RequestContext {
        match self.variant {
            AdapterVariant::TenantProxy => RequestContext {
                user: event.user.clone(),
                tenant_id: RequestContext::tenant_suffix(event.path_parameter("tenantId")),
                proxy: event.path_parameter("proxy").map(str::to_string),
            },
            AdapterVariant::TrackingLog => {
                let trace_id = context
                    .xray_trace_id
                    .clone()
                    .or_else(|| std::env::var(TRACE_ID_ENV).ok())
                    .unwrap_or_default();
                info!(
                    trace_id = %trace_id,
                    tracking_id = event.header(&self.tracking_id_key).unwrap_or_default(),
                    "Tracking invocation"
                );
                RequestContext::for_user(event.user.clone())
            }
        }
    }
}

/// Builds the router request from an event.
///
/// A proxy path segment replaces the event path.
pub fn build_request(
    event: &InvocationEvent,
    proxy: Option<&str>,
) -> Result<Request<Body>, AdapterError> {
    let path = match proxy {
        Some(proxy) => format!("/{}", proxy.trim_start_matches('/')),
        None => event.path.clone().unwrap_or_else(|| "/".to_string()),
    };

    let query = query_string(event);
    let uri = if query.is_empty() {
        path
    } else {
        format!("{}?{}", path, query)
    };

    let mut builder = Request::builder()
        .method(event.http_method.as_deref().unwrap_or("GET"))
        .uri(uri);

    if let Some(headers) = &event.multi_value_headers {
        for (name, values) in headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
    } else if let Some(headers) = &event.headers {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    let body = match &event.body {
        Some(body) if event.is_base64_encoded => Body::from(BASE64.decode(body)?),
        Some(body) => Body::from(body.clone()),
        None => Body::empty(),
    };

    Ok(builder.body(body)?)
}

/// Rebuilds the query string, preferring the multi-value parameters.
fn query_string(event: &InvocationEvent) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Some(params) = &event.multi_value_query_string_parameters {
        for (name, values) in params {
            for value in values {
                serializer.append_pair(name, value);
            }
        }
    } else if let Some(params) = &event.query_string_parameters {
        for (name, value) in params {
            serializer.append_pair(name, value);
        }
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter(variant: AdapterVariant) -> ServerlessAdapter {
        ServerlessAdapter::new(Router::new(), variant, "tracking-Id")
    }

    fn event(payload: Value) -> InvocationEvent {
        InvocationEvent::from_payload(payload).unwrap()
    }

    #[test]
    fn test_null_payload_is_empty_event() {
        assert_eq!(event(Value::Null), InvocationEvent::default());
    }

    #[test]
    fn test_tenant_proxy_context() {
        let event = event(json!({
            "pathParameters": { "tenantId": "abc", "proxy": "Patient/1" },
            "user": { "sub": "user-1", "cognito:groups": ["practitioner"] }
        }));
        let ctx = adapter(AdapterVariant::TenantProxy)
            .request_context(&event, &InvocationContext::default());

        assert_eq!(ctx.tenant_id, "-abc");
        assert_eq!(ctx.proxy.as_deref(), Some("Patient/1"));
        assert_eq!(ctx.user, Some(json!({ "sub": "user-1", "cognito:groups": ["practitioner"] })));
    }

    #[test]
    fn test_missing_or_empty_tenant() {
        let adapter = adapter(AdapterVariant::TenantProxy);
        let ctx = InvocationContext::default();

        let missing = event(json!({ "pathParameters": null }));
        assert_eq!(adapter.request_context(&missing, &ctx).tenant_id, "");

        let empty = event(json!({ "pathParameters": { "tenantId": "" } }));
        assert_eq!(adapter.request_context(&empty, &ctx).tenant_id, "");
    }

    #[test]
    fn test_tracking_log_context_has_no_tenant() {
        let event = event(json!({
            "pathParameters": { "tenantId": "abc" },
            "headers": { "Tracking-ID": "t-1" },
            "user": { "sub": "user-1" }
        }));
        let ctx = adapter(AdapterVariant::TrackingLog).request_context(
            &event,
            &InvocationContext {
                request_id: "r-1".to_string(),
                xray_trace_id: Some("Root=1-abc".to_string()),
            },
        );

        assert_eq!(ctx.tenant_id, "");
        assert_eq!(ctx.proxy, None);
        assert_eq!(ctx.user, Some(json!({ "sub": "user-1" })));
        assert_eq!(event.header("tracking-id"), Some("t-1"));
    }

    #[test]
    fn test_build_request() {
        let event = event(json!({
            "httpMethod": "POST",
            "path": "/tenant/abc/Patient",
            "multiValueHeaders": { "Content-Type": ["application/fhir+json"] },
            "multiValueQueryStringParameters": { "name": ["Jane Doe", "Smith"] },
            "queryStringParameters": { "ignored": "1" },
            "body": "eyJyZXNvdXJjZVR5cGUiOiJQYXRpZW50In0=",
            "isBase64Encoded": true
        }));

        let request = build_request(&event, Some("Patient")).unwrap();
        assert_eq!(request.method(), "POST");
        assert_eq!(request.uri().path(), "/Patient");
        assert_eq!(request.uri().query(), Some("name=Jane+Doe&name=Smith"));
        assert_eq!(request.headers()["content-type"], "application/fhir+json");
    }

    #[test]
    fn test_build_request_defaults() {
        let request = build_request(&InvocationEvent::default(), None).unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.uri(), "/");
    }

    #[test]
    fn test_invalid_base64_body() {
        let event = event(json!({ "body": "***", "isBase64Encoded": true }));
        assert!(matches!(
            build_request(&event, None),
            Err(AdapterError::Base64(_))
        ));
    }
}
