use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;

use crate::contract::{EventAction, ValidationError};

/// Decoded and validated record from the ordered event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub event_type: EventAction,
    pub event_id: String,
    pub timestamp: String,
    pub data: Value,
}

/// Parses raw stream records into typed events, preserving input order.
///
/// A record that fails to decode or validate is logged and skipped; it never
/// prevents processing of its siblings in the same batch.
pub fn parse_stream_records(records: &[Value]) -> Vec<StreamEvent> {
    let mut events = Vec::with_capacity(records.len());
    for record in records {
        match parse_stream_record(record) {
            Ok(event) => events.push(event),
            Err(error) => {
                tracing::warn!(error = %error, "skipping invalid stream record");
            }
        }
    }

    events
}

fn parse_stream_record(record: &Value) -> Result<StreamEvent, ValidationError> {
    let encoded = record
        .get("kinesis")
        .and_then(|kinesis| kinesis.get("data"))
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::new("record without kinesis data"))?;

    let decoded = BASE64
        .decode(encoded)
        .map_err(|error| ValidationError::new(format!("invalid base64 in record data: {error}")))?;
    let event: Value = serde_json::from_slice(&decoded)
        .map_err(|error| ValidationError::new(format!("invalid JSON in record data: {error}")))?;

    let event_type = match required_field(&event, "event_type")?.as_str() {
        Some("UPSERT") => EventAction::Upsert,
        Some("DROP") => EventAction::Drop,
        _ => {
            return Err(ValidationError::new(
                "event_type must be one of UPSERT, DROP",
            ))
        }
    };
    let event_id = required_field(&event, "event_id")?
        .as_str()
        .ok_or_else(|| ValidationError::new("event_id must be a string"))?
        .to_string();
    let timestamp = required_field(&event, "timestamp")?
        .as_str()
        .ok_or_else(|| ValidationError::new("timestamp must be a string"))?
        .to_string();
    let data = required_field(&event, "data")?.clone();

    Ok(StreamEvent {
        event_type,
        event_id,
        timestamp,
        data,
    })
}

fn required_field<'a>(event: &'a Value, field: &str) -> Result<&'a Value, ValidationError> {
    event
        .get(field)
        .ok_or_else(|| ValidationError::new(format!("missing required field: {field}")))
}
