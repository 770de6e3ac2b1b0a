use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Durable record of an asset's last-known state. At most one asset exists
/// per `(partition_key, sort_key)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub technology_name: String,
    pub instance_technology_name: String,
    pub asset_parent_name: String,
    pub asset_name: String,
    pub aws_account_number: String,
    pub hash_value: String,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn partition_key(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.technology_name,
            self.instance_technology_name,
            self.asset_parent_name,
            self.asset_name
        )
    }

    pub fn sort_key(&self) -> &str {
        &self.aws_account_number
    }

    /// Prefix shared by all children of the same parent; key of the sibling
    /// index in the keyed store.
    pub fn parent_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.technology_name, self.instance_technology_name, self.asset_parent_name
        )
    }

    pub fn has_changed(&self, event_hash: &str) -> bool {
        self.hash_value != event_hash
    }

    pub fn create_from_event(event: &Event, event_hash: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            technology_name: event.technology_name.clone(),
            instance_technology_name: event.instance_technology_name.clone(),
            asset_parent_name: event.asset_parent_name.clone(),
            asset_name: event.asset_name.clone(),
            aws_account_number: event.aws_account_number.clone(),
            hash_value: event_hash.to_string(),
            correlation_id: event.correlation_id.clone(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn update_from_event(&mut self, event: &Event, event_hash: &str, timestamp: DateTime<Utc>) {
        self.hash_value = event_hash.to_string();
        self.correlation_id = event.correlation_id.clone();
        self.updated_at = timestamp;
    }
}
