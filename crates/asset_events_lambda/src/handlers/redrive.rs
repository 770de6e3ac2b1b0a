use std::collections::BTreeMap;

use asset_events_core::contract::{stable_contract_json, DEFAULT_MAX_MESSAGES};
use asset_events_core::redrive::DlqEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::queue::{
    EventQueue, QueueAttribute, ReceivedMessage, ORIGINAL_QUEUE_URL_ATTRIBUTE,
    RETRY_COUNT_ATTRIBUTE,
};
use crate::handlers::MessageFailure;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedriveSummary {
    pub processed: usize,
    pub discarded: usize,
    pub errors: Vec<MessageFailure>,
}

enum RedriveOutcome {
    Redriven,
    Discarded,
}

/// Drains each dead-letter queue: messages under the retry ceiling go back
/// to their origin queue with an incremented counter, messages at the
/// ceiling are discarded.
///
/// Failures are isolated per message and per queue; one poisoned message or
/// unreachable DLQ never stops the remaining work.
pub fn process_dead_letter_queues(
    dlq_urls: &[String],
    queue: &impl EventQueue,
) -> RedriveSummary {
    let mut summary = RedriveSummary {
        processed: 0,
        discarded: 0,
        errors: Vec::new(),
    };

    for dlq_url in dlq_urls {
        let messages = match queue.receive(dlq_url, DEFAULT_MAX_MESSAGES) {
            Ok(messages) => messages,
            Err(error) => {
                summary
                    .errors
                    .push(MessageFailure::for_queue(dlq_url, error.to_string()));
                continue;
            }
        };

        for message in messages {
            match redrive_message(dlq_url, &message, queue) {
                Ok(RedriveOutcome::Redriven) => summary.processed += 1,
                Ok(RedriveOutcome::Discarded) => summary.discarded += 1,
                Err(error) => summary
                    .errors
                    .push(MessageFailure::for_message(&message.message_id, error)),
            }
        }
    }

    tracing::info!(
        component = "redrive_handler",
        dlq_count = dlq_urls.len(),
        processed = summary.processed,
        discarded = summary.discarded,
        errors = summary.errors.len(),
        "redrive run completed"
    );

    summary
}

fn redrive_message(
    dlq_url: &str,
    message: &ReceivedMessage,
    queue: &impl EventQueue,
) -> Result<RedriveOutcome, String> {
    let body: Value = serde_json::from_str(&message.body)
        .map_err(|error| format!("invalid DLQ message body: {error}"))?;
    let mut event = DlqEvent::from_message(
        message.message_id.clone(),
        dlq_url,
        body,
        message.retry_count(),
        message.original_queue_url(),
    );

    if event.has_exceeded_retries() {
        queue
            .delete(dlq_url, &message.receipt_handle)
            .map_err(|error| error.to_string())?;
        return Ok(RedriveOutcome::Discarded);
    }

    event.increment_retry_count();
    let attributes = BTreeMap::from([
        (
            RETRY_COUNT_ATTRIBUTE.to_string(),
            QueueAttribute::Number(event.retry_count.to_string()),
        ),
        (
            ORIGINAL_QUEUE_URL_ATTRIBUTE.to_string(),
            QueueAttribute::Text(event.original_queue_url.clone()),
        ),
    ]);
    queue
        .send(
            &event.original_queue_url,
            &stable_contract_json(&event.body),
            &attributes,
        )
        .map_err(|error| error.to_string())?;

    // Delete only after a successful re-publish so a failed move leaves the
    // message in the DLQ for the next run.
    queue
        .delete(dlq_url, &message.receipt_handle)
        .map_err(|error| error.to_string())?;

    Ok(RedriveOutcome::Redriven)
}
