//! DynamoDB access: the client seam, item conversion and key helpers.

mod client;
mod item;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{AwsDynamoDbClient, DynamoDbApi, DynamoDbClientError, Item, TransactWrite};
pub use item::{from_attribute_value, from_item, get_str, get_u64, to_attribute_value, to_item};

use aws_sdk_dynamodb::types::AttributeValue;

/// Partition key of the resource table.
pub const ID_FIELD: &str = "id";
/// Sort key of the resource table.
pub const VID_FIELD: &str = "vid";
pub const DOCUMENT_STATUS_FIELD: &str = "documentStatus";
pub const LOCK_END_TS_FIELD: &str = "lockEndTs";
pub const REFERENCES_FIELD: &str = "_references";
pub const TENANT_ID_FIELD: &str = "_tenantId";

/// Key of one version of a resource.
pub fn resource_key(id: &str, vid: u64) -> Item {
    Item::from([
        (ID_FIELD.to_string(), AttributeValue::S(id.to_string())),
        (VID_FIELD.to_string(), AttributeValue::N(vid.to_string())),
    ])
}

/// Appends the tenant suffix to a base table name.
pub fn tenant_table(base: &str, tenant_id: &str) -> String {
    format!("{base}{tenant_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key() {
        let key = resource_key("abc", 3);
        assert_eq!(key.get("id"), Some(&AttributeValue::S("abc".to_string())));
        assert_eq!(key.get("vid"), Some(&AttributeValue::N("3".to_string())));
    }

    #[test]
    fn test_tenant_table() {
        assert_eq!(tenant_table("resource-db-dev", "-abc"), "resource-db-dev-abc");
        assert_eq!(tenant_table("resource-db-dev", ""), "resource-db-dev");
    }
}
