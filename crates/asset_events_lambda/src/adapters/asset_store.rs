use std::collections::HashMap;

use asset_events_core::asset::Asset;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Index serving the sibling query: children of the same parent path within
/// one account.
pub const PARENT_PATH_INDEX: &str = "parent_path_index";

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("asset store request failed: {0}")]
    Request(String),

    #[error("malformed asset item: {0}")]
    Malformed(String),
}

/// Keyed lookup store holding the current known state of each asset.
pub trait AssetStore {
    /// Point lookup; an absent asset is not an error.
    fn find_by_key(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<Asset>, AssetStoreError>;

    /// All children under a parent path for one account, excluding assets
    /// whose state was produced by the given correlation id.
    fn find_by_parent_path(
        &self,
        parent_path: &str,
        account_number: &str,
        excluding_correlation_id: &str,
    ) -> Result<Vec<Asset>, AssetStoreError>;

    /// Idempotent upsert keyed by `(partition_key, sort_key)`. Last writer
    /// wins; there is no optimistic locking.
    fn save(&self, asset: &Asset) -> Result<(), AssetStoreError>;
}

pub struct DynamoDbAssetStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoDbAssetStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

impl AssetStore for DynamoDbAssetStore {
    fn find_by_key(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<Asset>, AssetStoreError> {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let partition_key = partition_key.to_string();
        let sort_key = sort_key.to_string();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .get_item()
                    .table_name(table_name)
                    .key("pk", AttributeValue::S(partition_key))
                    .key("sk", AttributeValue::S(sort_key))
                    .send()
                    .await
                    .map_err(|error| {
                        AssetStoreError::Request(format!("failed to read asset item: {error}"))
                    })
            })
        })?;

        output.item.as_ref().map(asset_from_item).transpose()
    }

    fn find_by_parent_path(
        &self,
        parent_path: &str,
        account_number: &str,
        excluding_correlation_id: &str,
    ) -> Result<Vec<Asset>, AssetStoreError> {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let parent_path = parent_path.to_string();
        let account_number = account_number.to_string();
        let excluding_correlation_id = excluding_correlation_id.to_string();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .query()
                    .table_name(table_name)
                    .index_name(PARENT_PATH_INDEX)
                    .key_condition_expression(
                        "parent_path = :parent_path AND aws_account_number = :account",
                    )
                    .filter_expression("correlation_id <> :correlation_id")
                    .expression_attribute_values(":parent_path", AttributeValue::S(parent_path))
                    .expression_attribute_values(":account", AttributeValue::S(account_number))
                    .expression_attribute_values(
                        ":correlation_id",
                        AttributeValue::S(excluding_correlation_id),
                    )
                    .send()
                    .await
                    .map_err(|error| {
                        AssetStoreError::Request(format!("failed to query sibling assets: {error}"))
                    })
            })
        })?;

        output
            .items
            .unwrap_or_default()
            .iter()
            .map(asset_from_item)
            .collect()
    }

    fn save(&self, asset: &Asset) -> Result<(), AssetStoreError> {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let item = asset_to_item(asset);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_item()
                    .table_name(table_name)
                    .set_item(Some(item))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        AssetStoreError::Request(format!("failed to save asset item: {error}"))
                    })
            })
        })
    }
}

fn asset_to_item(asset: &Asset) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("pk".to_string(), AttributeValue::S(asset.partition_key())),
        (
            "sk".to_string(),
            AttributeValue::S(asset.sort_key().to_string()),
        ),
        (
            "parent_path".to_string(),
            AttributeValue::S(asset.parent_path()),
        ),
        (
            "technology_name".to_string(),
            AttributeValue::S(asset.technology_name.clone()),
        ),
        (
            "instance_technology_name".to_string(),
            AttributeValue::S(asset.instance_technology_name.clone()),
        ),
        (
            "asset_parent_name".to_string(),
            AttributeValue::S(asset.asset_parent_name.clone()),
        ),
        (
            "asset_name".to_string(),
            AttributeValue::S(asset.asset_name.clone()),
        ),
        (
            "aws_account_number".to_string(),
            AttributeValue::S(asset.aws_account_number.clone()),
        ),
        (
            "hash_value".to_string(),
            AttributeValue::S(asset.hash_value.clone()),
        ),
        (
            "correlation_id".to_string(),
            AttributeValue::S(asset.correlation_id.clone()),
        ),
        (
            "created_at".to_string(),
            AttributeValue::S(asset.created_at.to_rfc3339()),
        ),
        (
            "updated_at".to_string(),
            AttributeValue::S(asset.updated_at.to_rfc3339()),
        ),
    ])
}

fn asset_from_item(item: &HashMap<String, AttributeValue>) -> Result<Asset, AssetStoreError> {
    Ok(Asset {
        technology_name: string_attribute(item, "technology_name")?,
        instance_technology_name: string_attribute(item, "instance_technology_name")?,
        asset_parent_name: string_attribute(item, "asset_parent_name")?,
        asset_name: string_attribute(item, "asset_name")?,
        aws_account_number: string_attribute(item, "aws_account_number")?,
        hash_value: string_attribute(item, "hash_value")?,
        correlation_id: string_attribute(item, "correlation_id")?,
        created_at: timestamp_attribute(item, "created_at")?,
        updated_at: timestamp_attribute(item, "updated_at")?,
    })
}

fn string_attribute(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<String, AssetStoreError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .ok_or_else(|| {
            AssetStoreError::Malformed(format!("missing or non-string attribute: {name}"))
        })
}

fn timestamp_attribute(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<DateTime<Utc>, AssetStoreError> {
    let raw = string_attribute(item, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| {
            AssetStoreError::Malformed(format!("attribute {name} is not an RFC 3339 time: {error}"))
        })
}
