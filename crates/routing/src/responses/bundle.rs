//! Bundle response building.

use serde_json::{Value, json};

/// Bundle types produced by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleType {
    /// Search results bundle.
    Searchset,
    /// History results bundle.
    History,
    /// Transaction response bundle.
    TransactionResponse,
}

impl BundleType {
    /// Returns the FHIR code string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleType::Searchset => "searchset",
            BundleType::History => "history",
            BundleType::TransactionResponse => "transaction-response",
        }
    }
}

/// A link in a Bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

impl BundleLink {
    pub fn new(relation: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            url: url.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "relation": self.relation,
            "url": self.url
        })
    }
}

/// Response details of a transaction-response entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResponse {
    pub status: String,
    pub location: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// An entry in a Bundle.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub full_url: Option<String>,
    pub resource: Option<Value>,
    /// `match` for search results.
    pub search_mode: Option<&'static str>,
    pub response: Option<EntryResponse>,
}

impl BundleEntry {
    /// Creates a search result entry.
    pub fn search_result(resource: Value, full_url: impl Into<String>) -> Self {
        Self {
            full_url: Some(full_url.into()),
            resource: Some(resource),
            search_mode: Some("match"),
            response: None,
        }
    }

    /// Creates a transaction-response entry.
    pub fn transaction_result(resource: Option<Value>, response: EntryResponse) -> Self {
        Self {
            full_url: None,
            resource,
            search_mode: None,
            response: Some(response),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut entry = json!({});

        if let Some(url) = &self.full_url {
            entry["fullUrl"] = json!(url);
        }

        if let Some(resource) = &self.resource {
            entry["resource"] = resource.clone();
        }

        if let Some(mode) = self.search_mode {
            entry["search"] = json!({ "mode": mode });
        }

        if let Some(response) = &self.response {
            let mut resp = json!({ "status": response.status });
            if let Some(location) = &response.location {
                resp["location"] = json!(location);
            }
            if let Some(etag) = &response.etag {
                resp["etag"] = json!(etag);
            }
            if let Some(last_modified) = &response.last_modified {
                resp["lastModified"] = json!(last_modified);
            }
            entry["response"] = resp;
        }

        entry
    }
}

/// Builder for Bundle resources.
#[derive(Debug)]
pub struct BundleBuilder {
    bundle_type: BundleType,
    total: Option<u64>,
    links: Vec<BundleLink>,
    entries: Vec<BundleEntry>,
}

impl BundleBuilder {
    pub fn new(bundle_type: BundleType) -> Self {
        Self {
            bundle_type,
            total: None,
            links: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn searchset() -> Self {
        Self::new(BundleType::Searchset)
    }

    pub fn history() -> Self {
        Self::new(BundleType::History)
    }

    pub fn transaction_response() -> Self {
        Self::new(BundleType::TransactionResponse)
    }

    pub fn total(mut self, count: u64) -> Self {
        self.total = Some(count);
        self
    }

    pub fn add_link(mut self, link: BundleLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn add_entry(mut self, entry: BundleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Builds the Bundle resource with a fresh id and `meta.lastUpdated`.
    pub fn build(self) -> Value {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut bundle = json!({
            "resourceType": "Bundle",
            "id": uuid::Uuid::new_v4().to_string(),
            "meta": { "lastUpdated": now },
            "type": self.bundle_type.as_str()
        });

        if let Some(total) = self.total {
            bundle["total"] = json!(total);
        }

        bundle["link"] = json!(self.links.iter().map(|l| l.to_json()).collect::<Vec<_>>());
        bundle["entry"] = json!(self.entries.iter().map(|e| e.to_json()).collect::<Vec<_>>());

        bundle
    }
}
