use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{DynamoDbApi, DynamoDbClientError, Item, TransactWrite, get_u64};

/// In-memory table store keyed on `jobId`, or on `id` + `vid`.
#[derive(Debug, Default)]
pub struct MockDynamoDb {
    tables: Mutex<HashMap<String, Vec<Item>>>,
    transactions: Mutex<Vec<Vec<TransactWrite>>>,
}

impl MockDynamoDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: &str, item: Item) {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        rows.retain(|row| !same_key(row, &item));
        rows.push(item);
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn transactions(&self) -> Vec<Vec<TransactWrite>> {
        self.transactions.lock().unwrap().clone()
    }

    fn exists(&self, table: &str, key: &Item) -> bool {
        self.items(table).iter().any(|row| matches_key(row, key))
    }
}

fn key_of(item: &Item) -> Item {
    let names: &[&str] = if item.contains_key("jobId") {
        &["jobId"]
    } else {
        &["id", "vid"]
    };
    names
        .iter()
        .filter_map(|n| item.get(*n).map(|v| (n.to_string(), v.clone())))
        .collect()
}

fn same_key(a: &Item, b: &Item) -> bool {
    key_of(a) == key_of(b)
}

fn matches_key(row: &Item, key: &Item) -> bool {
    key.iter().all(|(k, v)| row.get(k) == Some(v))
}

#[async_trait]
impl DynamoDbApi for MockDynamoDb {
    async fn query_latest(&self, table: &str, id: &str) -> Result<Option<Item>, DynamoDbClientError> {
        let id = AttributeValue::S(id.to_string());
        Ok(self
            .items(table)
            .into_iter()
            .filter(|row| row.get("id") == Some(&id))
            .max_by_key(|row| get_u64(row, "vid").unwrap_or_default()))
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, DynamoDbClientError> {
        Ok(self
            .items(table)
            .into_iter()
            .find(|row| matches_key(row, &key)))
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), DynamoDbClientError> {
        self.insert(table, item);
        Ok(())
    }

    async fn query_index(
        &self,
        table: &str,
        _index: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, DynamoDbClientError> {
        let value = AttributeValue::S(value.to_string());
        Ok(self
            .items(table)
            .into_iter()
            .filter(|row| row.get(attribute) == Some(&value))
            .collect())
    }

    async fn update_attribute(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
        expected: Option<(&str, AttributeValue)>,
    ) -> Result<(), DynamoDbClientError> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| matches_key(row, &key)))
            .ok_or(DynamoDbClientError::ConditionalCheckFailed)?;

        if let Some((name, current)) = expected {
            if row.get(name) != Some(&current) {
                return Err(DynamoDbClientError::ConditionalCheckFailed);
            }
        }

        row.insert(attribute.to_string(), value);
        Ok(())
    }

    async fn transact_write(&self, writes: Vec<TransactWrite>) -> Result<(), DynamoDbClientError> {
        for write in &writes {
            if let TransactWrite::PutNew { table, item } = write {
                if self.exists(table, &key_of(item)) {
                    return Err(DynamoDbClientError::TransactionCanceled(
                        "ConditionalCheckFailed".to_string(),
                    ));
                }
            }
        }

        self.transactions.lock().unwrap().push(writes.clone());

        for write in writes {
            match write {
                TransactWrite::PutNew { table, item } => self.insert(&table, item),
                TransactWrite::SetAttribute {
                    table,
                    key,
                    attribute,
                    value,
                } => {
                    let mut tables = self.tables.lock().unwrap();
                    if let Some(row) = tables
                        .get_mut(&table)
                        .and_then(|rows| rows.iter_mut().find(|row| matches_key(row, &key)))
                    {
                        row.insert(attribute, value);
                    }
                }
            }
        }
        Ok(())
    }
}
