use std::collections::BTreeMap;

use asset_events_core::asset::Asset;
use asset_events_core::contract::{stable_contract_json, EventAction, PointerMessage};
use asset_events_core::payload::{drop_envelope, upsert_envelope};
use thiserror::Error;

use crate::adapters::claim_check::{ClaimCheckError, ClaimCheckStore};
use crate::adapters::queue::{EventQueue, QueueError};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    ClaimCheck(#[from] ClaimCheckError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Publishes decisions downstream via the claim-check pattern: the full
/// payload goes to blob storage first, then a pointer message referencing it
/// goes on the queue.
///
/// The blob write strictly precedes the queue send so a consumer never
/// receives a pointer to an object that does not exist yet. There is no
/// compensating delete if the send fails after a successful write; the
/// orphaned blob is an accepted leak.
pub struct QueuePublisher<'a, C, Q> {
    upsert_queue_url: String,
    drop_queue_url: String,
    claim_check: &'a C,
    queue: &'a Q,
}

impl<'a, C: ClaimCheckStore, Q: EventQueue> QueuePublisher<'a, C, Q> {
    pub fn new(
        upsert_queue_url: impl Into<String>,
        drop_queue_url: impl Into<String>,
        claim_check: &'a C,
        queue: &'a Q,
    ) -> Self {
        Self {
            upsert_queue_url: upsert_queue_url.into(),
            drop_queue_url: drop_queue_url.into(),
            claim_check,
            queue,
        }
    }

    pub fn publish_upsert(&self, asset: &Asset) -> Result<(), PublishError> {
        let payload = upsert_envelope(asset);
        let location = self
            .claim_check
            .store(EventAction::Upsert.as_str(), &payload)?;

        let message = PointerMessage {
            event_type: EventAction::Upsert,
            event_location: location.to_string(),
        };
        self.queue.send(
            &self.upsert_queue_url,
            &stable_contract_json(&message),
            &BTreeMap::new(),
        )?;

        Ok(())
    }

    /// One stored batch payload and one pointer message for the whole batch.
    pub fn publish_drop(&self, assets: &[Asset]) -> Result<(), PublishError> {
        let payload = drop_envelope(assets);
        let location = self
            .claim_check
            .store(EventAction::Drop.as_str(), &payload)?;

        let message = PointerMessage {
            event_type: EventAction::Drop,
            event_location: location.to_string(),
        };
        self.queue.send(
            &self.drop_queue_url,
            &stable_contract_json(&message),
            &BTreeMap::new(),
        )?;

        Ok(())
    }
}
