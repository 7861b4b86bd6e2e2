//! Removal of bookkeeping fields from stored items.

use serde_json::Value;

use crate::dynamodb::{
    DOCUMENT_STATUS_FIELD, LOCK_END_TS_FIELD, REFERENCES_FIELD, TENANT_ID_FIELD, VID_FIELD,
};

const INTERNAL_FIELDS: &[&str] = &[
    DOCUMENT_STATUS_FIELD,
    LOCK_END_TS_FIELD,
    VID_FIELD,
    REFERENCES_FIELD,
    TENANT_ID_FIELD,
    "_id",
];

/// Strips internal fields from a stored item, leaving the FHIR resource.
///
/// Non-object values are returned unchanged.
pub fn clean_item(mut item: Value) -> Value {
    if let Value::Object(map) = &mut item {
        for field in INTERNAL_FIELDS {
            map.remove(*field);
        }
    }
    item
}
