use serde_json::json;
use sha2::{Digest, Sha256};

use crate::event::Event;

/// Deterministic content hash over an event's identity-relevant fields.
///
/// The five identity fields plus `metadata` are serialized with
/// lexicographically sorted keys at every nesting level and digested with
/// SHA-256. Two events with structurally equal identity fields and metadata
/// produce the same hash regardless of field insertion order.
pub fn event_fingerprint(event: &Event) -> String {
    let content = json!({
        "technology_name": event.technology_name,
        "instance_technology_name": event.instance_technology_name,
        "asset_parent_name": event.asset_parent_name,
        "asset_name": event.asset_name,
        "aws_account_number": event.aws_account_number,
        "metadata": event.metadata,
    });

    let mut hasher = Sha256::new();
    hasher.update(crate::contract::stable_contract_json(&content));
    format!("{:x}", hasher.finalize())
}
