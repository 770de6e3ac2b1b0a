use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::asset::Asset;
use crate::contract::{EventAction, ValidationError};

/// Column-level metadata carried by upsert events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub attribute_name: String,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub comment_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexedField {
    pub indexed_field_composition: Vec<String>,
}

/// Fully-denormalized payload delivered downstream for a novel or changed
/// asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpsertEvent {
    pub correlation_id: String,
    pub status: String,
    pub asset_name: String,
    pub asset_parent_name: String,
    pub asset_counts: String,
    pub aws_account_number: String,
    pub technology_service_name: String,
    pub asset_type: String,
    pub instance_technology_name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub indexed_field_list: Vec<IndexedField>,
}

impl UpsertEvent {
    pub fn from_value(data: &Value) -> Result<Self, ValidationError> {
        serde_json::from_value(data.clone())
            .map_err(|error| ValidationError::new(format!("invalid upsert event: {error}")))
    }
}

/// Downstream payload for a removed asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DropEvent {
    pub correlation_id: String,
    pub status: String,
    pub asset_name: String,
    pub asset_parent_name: String,
    pub asset_counts: String,
    pub aws_account_number: String,
    pub technology_service_name: String,
    pub asset_type: String,
    pub instance_technology_name: String,
}

impl DropEvent {
    pub fn from_value(data: &Value) -> Result<Self, ValidationError> {
        serde_json::from_value(data.clone())
            .map_err(|error| ValidationError::new(format!("invalid drop event: {error}")))
    }
}

/// Claim-check payload for a single upserted asset.
pub fn upsert_envelope(asset: &Asset) -> Value {
    json!({
        "event_type": EventAction::Upsert.as_str(),
        "asset": asset,
    })
}

/// Claim-check payload for a batch of dropped assets.
pub fn drop_envelope(assets: &[Asset]) -> Value {
    json!({
        "event_type": EventAction::Drop.as_str(),
        "assets": assets,
    })
}

/// Extracts the asset list from a stored claim-check payload, accepting both
/// the single-asset and batch envelope shapes.
pub fn envelope_assets(payload: &Value) -> Result<Vec<Value>, ValidationError> {
    if let Some(asset) = payload.get("asset") {
        return Ok(vec![asset.clone()]);
    }
    if let Some(assets) = payload.get("assets").and_then(Value::as_array) {
        return Ok(assets.clone());
    }

    Err(ValidationError::new(
        "stored payload carries neither 'asset' nor 'assets'",
    ))
}
