//! Elasticsearch Query DSL for type-level search.
//!
//! Static filters become `terms` clauses. Every other query parameter
//! becomes a `query_string` clause over the parameter field and its children.

use fhircloud_interface::{ComparisonOperator, LogicalOperator, SearchFilter};
use serde_json::{Value, json};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Parameters that control paging and rendering rather than matching.
const CONTROL_PARAMETERS: &[&str] = &[
    "_count",
    "_getpagesoffset",
    "_format",
    "_sort",
    "_total",
    "_summary",
    "_elements",
    "_include",
    "_revinclude",
];

/// A complete query body with the paging it was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct EsQuery {
    pub body: Value,
    pub from: usize,
    pub size: usize,
}

/// Builds the search body for one resource type.
pub fn build_search_query(filters: &[SearchFilter], query_params: &[(String, String)]) -> EsQuery {
    let mut filter_clauses = Vec::new();
    let mut should_clauses = Vec::new();
    let mut must_not_clauses = Vec::new();

    for filter in filters {
        let field = format!("{}.keyword", filter.key);
        let clause = json!({ "terms": { field: filter.value } });
        match (filter.comparison_operator, filter.logical_operator) {
            (ComparisonOperator::NotEq, _) => must_not_clauses.push(clause),
            (ComparisonOperator::Eq, LogicalOperator::And) => filter_clauses.push(clause),
            (ComparisonOperator::Eq, LogicalOperator::Or) => should_clauses.push(clause),
        }
    }

    let must_clauses: Vec<Value> = query_params
        .iter()
        .filter(|(name, _)| !CONTROL_PARAMETERS.contains(&name.as_str()))
        .map(|(name, value)| parameter_clause(name, value))
        .collect();

    let mut bool_query = json!({ "filter": filter_clauses });
    if !must_clauses.is_empty() {
        bool_query["must"] = json!(must_clauses);
    }
    if !should_clauses.is_empty() {
        bool_query["should"] = json!(should_clauses);
        bool_query["minimum_should_match"] = json!(1);
    }
    if !must_not_clauses.is_empty() {
        bool_query["must_not"] = json!(must_not_clauses);
    }

    let size = page_size(query_params);
    let from = page_offset(query_params);

    EsQuery {
        body: json!({
            "query": { "bool": bool_query },
            "from": from,
            "size": size,
            "track_total_hits": true,
        }),
        from,
        size,
    }
}

fn parameter_clause(name: &str, value: &str) -> Value {
    let field = if name == "_id" { "id" } else { name };
    json!({
        "query_string": {
            "fields": [field, format!("{field}.*")],
            "query": escape_query_string(value),
            "default_operator": "AND",
            "lenient": true,
        }
    })
}

fn last_param<'a>(query_params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query_params
        .iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn page_size(query_params: &[(String, String)]) -> usize {
    last_param(query_params, "_count")
        .and_then(|v| v.parse::<usize>().ok())
        .map(|n| n.clamp(1, MAX_PAGE_SIZE))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

fn page_offset(query_params: &[(String, String)]) -> usize {
    last_param(query_params, "_getpagesoffset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Escapes `query_string` reserved characters.
fn escape_query_string(value: &str) -> String {
    const RESERVED: &[char] = &[
        '+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*',
        '?', ':', '\\', '/',
    ];

    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
