use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem, Update};

/// A raw DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum DynamoDbClientError {
    ConditionalCheckFailed,
    TransactionCanceled(String),
    Throttled(String),
    Unavailable(String),
    InvalidInput(String),
    Internal(String),
}

/// One write staged into a `TransactWriteItems` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactWrite {
    /// Puts a new item; fails the whole transaction if an item with the same key exists.
    PutNew { table: String, item: Item },
    /// Sets a single attribute on an existing item.
    SetAttribute {
        table: String,
        key: Item,
        attribute: String,
        value: AttributeValue,
    },
}

/// The subset of DynamoDB used by the persistence services.
#[async_trait]
pub trait DynamoDbApi: Send + Sync {
    /// Returns the item with the highest sort key for the partition `id`.
    async fn query_latest(&self, table: &str, id: &str) -> Result<Option<Item>, DynamoDbClientError>;

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, DynamoDbClientError>;

    async fn put_item(&self, table: &str, item: Item) -> Result<(), DynamoDbClientError>;

    /// Returns every item of a secondary index whose `attribute` equals `value`.
    async fn query_index(
        &self,
        table: &str,
        index: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, DynamoDbClientError>;

    /// Sets `attribute` to `value`, optionally only when `expected` currently matches.
    async fn update_attribute(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
        expected: Option<(&str, AttributeValue)>,
    ) -> Result<(), DynamoDbClientError>;

    async fn transact_write(&self, writes: Vec<TransactWrite>) -> Result<(), DynamoDbClientError>;
}

#[derive(Debug, Clone)]
pub struct AwsDynamoDbClient {
    client: Client,
}

impl AwsDynamoDbClient {
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl DynamoDbApi for AwsDynamoDbClient {
    async fn query_latest(&self, table: &str, id: &str) -> Result<Option<Item>, DynamoDbClientError> {
        let out = self
            .client
            .query()
            .table_name(table)
            .key_condition_expression("id = :id")
            .expression_attribute_values(":id", AttributeValue::S(id.to_string()))
            .scan_index_forward(false)
            .limit(1)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(out.items.unwrap_or_default().into_iter().next())
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, DynamoDbClientError> {
        let out = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(out.item)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), DynamoDbClientError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Item>, DynamoDbClientError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let out = self
                .client
                .query()
                .table_name(table)
                .index_name(index)
                .key_condition_expression("#k = :v")
                .expression_attribute_names("#k", attribute)
                .expression_attribute_values(":v", AttributeValue::S(value.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            items.extend(out.items.unwrap_or_default());
            match out.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn update_attribute(
        &self,
        table: &str,
        key: Item,
        attribute: &str,
        value: AttributeValue,
        expected: Option<(&str, AttributeValue)>,
    ) -> Result<(), DynamoDbClientError> {
        let mut req = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(key))
            .update_expression("SET #a = :v")
            .expression_attribute_names("#a", attribute)
            .expression_attribute_values(":v", value);

        if let Some((name, current)) = expected {
            req = req
                .condition_expression("#e = :e")
                .expression_attribute_names("#e", name)
                .expression_attribute_values(":e", current);
        }

        req.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    async fn transact_write(&self, writes: Vec<TransactWrite>) -> Result<(), DynamoDbClientError> {
        let mut items = Vec::with_capacity(writes.len());
        for write in writes {
            items.push(to_transact_item(write)?);
        }

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }
}

fn to_transact_item(write: TransactWrite) -> Result<TransactWriteItem, DynamoDbClientError> {
    let invalid = |e: aws_sdk_dynamodb::error::BuildError| {
        DynamoDbClientError::InvalidInput(format!("failed to build transact item: {e}"))
    };

    let item = match write {
        TransactWrite::PutNew { table, item } => {
            let put = Put::builder()
                .table_name(table)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .build()
                .map_err(invalid)?;
            TransactWriteItem::builder().put(put).build()
        }
        TransactWrite::SetAttribute {
            table,
            key,
            attribute,
            value,
        } => {
            let update = Update::builder()
                .table_name(table)
                .set_key(Some(key))
                .update_expression("SET #a = :v")
                .expression_attribute_names("#a", attribute)
                .expression_attribute_values(":v", value)
                .build()
                .map_err(invalid)?;
            TransactWriteItem::builder().update(update).build()
        }
    };

    Ok(item)
}

fn map_sdk_error<E>(err: aws_sdk_dynamodb::error::SdkError<E>) -> DynamoDbClientError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let fallback = format!("{err:?}");

    match err {
        aws_sdk_dynamodb::error::SdkError::ServiceError(service_err) => {
            let code = service_err.err().code().unwrap_or("Unknown");
            let message = service_err
                .err()
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.clone());
            match code {
                "ConditionalCheckFailedException" => DynamoDbClientError::ConditionalCheckFailed,
                "TransactionCanceledException" => {
                    DynamoDbClientError::TransactionCanceled(message)
                }
                "ProvisionedThroughputExceededException"
                | "ThrottlingException"
                | "RequestLimitExceeded" => DynamoDbClientError::Throttled(message),
                "ValidationException" | "ResourceNotFoundException" => {
                    DynamoDbClientError::InvalidInput(message)
                }
                _ => DynamoDbClientError::Internal(message),
            }
        }
        aws_sdk_dynamodb::error::SdkError::TimeoutError(_) => {
            DynamoDbClientError::Unavailable(fallback)
        }
        aws_sdk_dynamodb::error::SdkError::DispatchFailure(_) => {
            DynamoDbClientError::Unavailable(fallback)
        }
        _ => DynamoDbClientError::Internal(fallback),
    }
}
