use asset_events_core::contract::EventAction;
use asset_events_core::decision::decide_event_action;
use asset_events_core::event::Event;
use asset_events_core::stream::{parse_stream_records, StreamEvent};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::asset_store::AssetStore;
use crate::adapters::claim_check::ClaimCheckStore;
use crate::adapters::queue::EventQueue;
use crate::publisher::QueuePublisher;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemError {
    pub event_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionSummary {
    pub received: usize,
    pub decided: usize,
    pub published: usize,
    pub skipped: usize,
    pub errors: Vec<ItemError>,
}

/// Processes one batch of raw stream records end to end: parse, consult the
/// asset store, decide, persist, and publish.
///
/// Records that fail parsing are skipped; decision or persistence failures
/// for one event are captured per item and never abort the batch.
pub fn handle_decision_batch<C: ClaimCheckStore, Q: EventQueue>(
    records: &[Value],
    asset_store: &impl AssetStore,
    publisher: &QueuePublisher<'_, C, Q>,
) -> DecisionSummary {
    let stream_events = parse_stream_records(records);
    let mut summary = DecisionSummary {
        received: records.len(),
        decided: 0,
        published: 0,
        skipped: records.len() - stream_events.len(),
        errors: Vec::new(),
    };

    for stream_event in &stream_events {
        match process_stream_event(stream_event, asset_store, publisher) {
            Ok(published) => {
                summary.decided += 1;
                if published {
                    summary.published += 1;
                }
            }
            Err(error) => {
                summary.errors.push(ItemError {
                    event_id: stream_event.event_id.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        component = "decision_handler",
        received = summary.received,
        decided = summary.decided,
        published = summary.published,
        skipped = summary.skipped,
        errors = summary.errors.len(),
        "decision batch completed"
    );

    summary
}

fn process_stream_event<C: ClaimCheckStore, Q: EventQueue>(
    stream_event: &StreamEvent,
    asset_store: &impl AssetStore,
    publisher: &QueuePublisher<'_, C, Q>,
) -> Result<bool, String> {
    let event = Event::from_value(&stream_event.data).map_err(|error| error.to_string())?;

    if stream_event.event_type == EventAction::Drop {
        // A removal drops every sibling under the parent whose state the
        // current event did not produce (different correlation id).
        let siblings = asset_store
            .find_by_parent_path(
                &event.parent_path(),
                &event.aws_account_number,
                &event.correlation_id,
            )
            .map_err(|error| error.to_string())?;
        if siblings.is_empty() {
            return Ok(false);
        }
        publisher
            .publish_drop(&siblings)
            .map_err(|error| error.to_string())?;
        return Ok(true);
    }

    let existing = asset_store
        .find_by_key(&event.partition_key(), &event.aws_account_number)
        .map_err(|error| error.to_string())?;
    let decision = decide_event_action(&event, existing, Utc::now());

    if decision.should_save_asset() {
        asset_store
            .save(&decision.asset)
            .map_err(|error| error.to_string())?;
    }

    if decision.is_upsert() {
        publisher
            .publish_upsert(&decision.asset)
            .map_err(|error| error.to_string())?;
        return Ok(true);
    }

    Ok(false)
}
