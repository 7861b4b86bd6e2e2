//! Per-invocation request context.
//!
//! The serverless adapter attaches a [`RequestContext`] to every adapted
//! request as an `http` extension. The router reads it back to scope
//! persistence and search calls to the tenant.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transient data copied from an invocation event onto the adapted request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Identity claims provided by the platform, copied verbatim.
    pub user: Option<Value>,

    /// Tenant suffix: empty, or `-` followed by the tenant path parameter.
    pub tenant_id: String,

    /// The proxied path segment, when the platform routed through a proxy resource.
    pub proxy: Option<String>,
}

impl RequestContext {
    /// Creates a context for the given user with no tenant and no proxy.
    pub fn for_user(user: Option<Value>) -> Self {
        Self {
            user,
            ..Default::default()
        }
    }

    /// Builds the tenant suffix from an optional tenant path parameter.
    ///
    /// A missing or empty tenant yields an empty suffix.
    pub fn tenant_suffix(tenant: Option<&str>) -> String {
        match tenant {
            Some(t) if !t.is_empty() => format!("-{}", t),
            _ => String::new(),
        }
    }
}
