use serde_json::Value;

use crate::contract::MAX_RETRY_COUNT;

pub const DLQ_SUFFIX: &str = "-dlq";

/// Message recovered from a dead-letter queue, with its redrive bookkeeping
/// reconstructed from message attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DlqEvent {
    pub message_id: String,
    pub queue_url: String,
    pub original_queue_url: String,
    pub body: Value,
    pub retry_count: u32,
}

impl DlqEvent {
    /// Both attributes are optional on read: a missing retry count means the
    /// message has never been redriven, and a missing origin falls back to
    /// the DLQ url with its `-dlq` suffix stripped.
    pub fn from_message(
        message_id: impl Into<String>,
        dlq_url: &str,
        body: Value,
        retry_count: Option<u32>,
        original_queue_url: Option<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            queue_url: dlq_url.to_string(),
            original_queue_url: original_queue_url
                .unwrap_or_else(|| fallback_original_queue_url(dlq_url)),
            body,
            retry_count: retry_count.unwrap_or(0),
        }
    }

    /// A message that has failed `MAX_RETRY_COUNT` end-to-end attempts is
    /// presumed poisoned and discarded rather than cycling forever.
    pub fn has_exceeded_retries(&self) -> bool {
        self.retry_count >= MAX_RETRY_COUNT
    }

    pub fn increment_retry_count(&mut self) {
        self.retry_count += 1;
    }
}

pub fn fallback_original_queue_url(dlq_url: &str) -> String {
    dlq_url.replace(DLQ_SUFFIX, "")
}
