use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::contract::ValidationError;

/// Inbound change notification about a single asset. Transient; never
/// persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub technology_name: String,
    pub instance_technology_name: String,
    pub asset_parent_name: String,
    pub asset_name: String,
    pub aws_account_number: String,
    pub status: String,
    pub correlation_id: String,
    pub metadata: Map<String, Value>,
}

impl Event {
    /// Builds an event from the decoded `data` field of a stream record.
    ///
    /// The five identity fields and `correlation_id` are required; `status`
    /// and `metadata` default to empty when absent.
    pub fn from_value(data: &Value) -> Result<Self, ValidationError> {
        let object = data
            .as_object()
            .ok_or_else(|| ValidationError::new("event data must be a JSON object"))?;

        Ok(Self {
            technology_name: required_string(object, "technology_name")?,
            instance_technology_name: required_string(object, "instance_technology_name")?,
            asset_parent_name: required_string(object, "asset_parent_name")?,
            asset_name: required_string(object, "asset_name")?,
            aws_account_number: required_string(object, "aws_account_number")?,
            status: optional_string(object, "status"),
            correlation_id: required_string(object, "correlation_id")?,
            metadata: object
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }

    pub fn partition_key(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.technology_name,
            self.instance_technology_name,
            self.asset_parent_name,
            self.asset_name
        )
    }

    pub fn parent_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.technology_name, self.instance_technology_name, self.asset_parent_name
        )
    }
}

fn required_string(object: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::new(format!("missing required event field: {field}")))
}

fn optional_string(object: &Map<String, Value>, field: &str) -> String {
    object
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
