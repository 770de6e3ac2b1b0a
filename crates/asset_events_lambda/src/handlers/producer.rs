use asset_events_core::contract::{stable_contract_value, PointerMessage};
use asset_events_core::payload::{envelope_assets, DropEvent, UpsertEvent};
use serde::{Deserialize, Serialize};

use crate::adapters::claim_check::ClaimCheckStore;
use crate::adapters::forwarder::EventForwarder;
use crate::adapters::queue::{EventQueue, ReceivedMessage};
use crate::handlers::MessageFailure;

/// Which pointer queue this producer drains, and therefore which payload
/// type it forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerKind {
    Upsert,
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProducerSummary {
    pub processed: usize,
    pub errors: Vec<MessageFailure>,
}

/// Drains pointer messages from a queue, resolves each through the claim
/// check, and forwards the denormalized events downstream.
///
/// A message whose claim check cannot be resolved stays on the queue for
/// natural redelivery. Per-asset parse failures are recorded but do not
/// block deletion once every parseable asset was forwarded; a forward
/// failure leaves the message in place so the whole batch is retried.
pub fn run_producer(
    queue_url: &str,
    max_messages: usize,
    queue: &impl EventQueue,
    claim_check: &impl ClaimCheckStore,
    forwarder: &impl EventForwarder,
    kind: ProducerKind,
) -> ProducerSummary {
    let mut summary = ProducerSummary {
        processed: 0,
        errors: Vec::new(),
    };

    let messages = match queue.receive(queue_url, max_messages) {
        Ok(messages) => messages,
        Err(error) => {
            summary
                .errors
                .push(MessageFailure::for_queue(queue_url, error.to_string()));
            return summary;
        }
    };

    for message in messages {
        let delete = process_pointer_message(&message, claim_check, forwarder, kind, &mut summary);
        if !delete {
            continue;
        }

        match queue.delete(queue_url, &message.receipt_handle) {
            Ok(()) => summary.processed += 1,
            Err(error) => summary.errors.push(MessageFailure::for_message(
                &message.message_id,
                error.to_string(),
            )),
        }
    }

    tracing::info!(
        component = "producer_handler",
        queue_url,
        processed = summary.processed,
        errors = summary.errors.len(),
        "producer batch completed"
    );

    summary
}

/// Returns whether the message should be deleted from the queue.
fn process_pointer_message(
    message: &ReceivedMessage,
    claim_check: &impl ClaimCheckStore,
    forwarder: &impl EventForwarder,
    kind: ProducerKind,
    summary: &mut ProducerSummary,
) -> bool {
    let pointer: PointerMessage = match serde_json::from_str(&message.body) {
        Ok(pointer) => pointer,
        Err(error) => {
            summary.errors.push(MessageFailure::for_message(
                &message.message_id,
                format!("invalid pointer message: {error}"),
            ));
            return false;
        }
    };

    let payload = match claim_check.read(&pointer.event_location) {
        Ok(payload) => payload,
        Err(error) => {
            summary.errors.push(MessageFailure::for_message(
                &message.message_id,
                error.to_string(),
            ));
            return false;
        }
    };

    let assets = match envelope_assets(&payload) {
        Ok(assets) => assets,
        Err(error) => {
            summary.errors.push(MessageFailure::for_message(
                &message.message_id,
                error.to_string(),
            ));
            return false;
        }
    };

    let mut forward_failed = false;
    for asset in &assets {
        let outbound = match kind {
            ProducerKind::Upsert => UpsertEvent::from_value(asset).map(stable_contract_value),
            ProducerKind::Drop => DropEvent::from_value(asset).map(stable_contract_value),
        };

        match outbound {
            Ok(event) => {
                if let Err(error) = forwarder.forward(&event) {
                    forward_failed = true;
                    summary.errors.push(MessageFailure::for_message(
                        &message.message_id,
                        error.to_string(),
                    ));
                }
            }
            Err(error) => {
                summary.errors.push(MessageFailure::for_message(
                    &message.message_id,
                    error.to_string(),
                ));
            }
        }
    }

    !forward_failed
}
