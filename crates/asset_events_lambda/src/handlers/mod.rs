use serde::{Deserialize, Serialize};

pub mod decision;
pub mod producer;
pub mod redrive;

/// Per-message failure entry shared by the queue-driven handlers; keyed by
/// message id for per-message failures and by queue url for failed fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_url: Option<String>,
    pub error: String,
}

impl MessageFailure {
    pub fn for_message(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            queue_url: None,
            error: error.into(),
        }
    }

    pub fn for_queue(queue_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: None,
            queue_url: Some(queue_url.into()),
            error: error.into(),
        }
    }
}
