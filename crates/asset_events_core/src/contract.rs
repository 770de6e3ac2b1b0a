use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of redrive attempts before a dead-letter message is
/// discarded as poisoned.
pub const MAX_RETRY_COUNT: u32 = 5;

/// Default receive batch size for queue consumers.
pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// Action decided for an inbound change event.
///
/// Wire serialization uses the upper-case names (`"UPSERT"`, `"DROP"`,
/// `"NO_ACTION"`); [`EventAction::as_str`] gives the lower-case form used in
/// stored payload envelopes and object key paths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Upsert,
    Drop,
    NoAction,
}

impl EventAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Drop => "drop",
            Self::NoAction => "no_action",
        }
    }
}

/// Small message placed on the queues; the full payload lives behind
/// `event_location` in blob storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointerMessage {
    pub event_type: EventAction,
    pub event_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}

pub fn stable_contract_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).expect("serialization of contract value should not fail")
}
