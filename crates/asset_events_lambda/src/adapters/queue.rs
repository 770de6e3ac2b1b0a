use std::collections::BTreeMap;

use aws_sdk_sqs::types::MessageAttributeValue;
use thiserror::Error;

pub const RETRY_COUNT_ATTRIBUTE: &str = "retry_count";
pub const ORIGINAL_QUEUE_URL_ATTRIBUTE: &str = "original_queue_url";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to send queue message: {0}")]
    Send(String),

    #[error("failed to receive queue messages: {0}")]
    Receive(String),

    #[error("failed to delete queue message: {0}")]
    Delete(String),
}

/// Typed message attribute; the transport distinguishes numeric and string
/// attributes, both carried as strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAttribute {
    Number(String),
    Text(String),
}

impl QueueAttribute {
    pub fn value(&self) -> &str {
        match self {
            Self::Number(value) | Self::Text(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    pub attributes: BTreeMap<String, QueueAttribute>,
}

impl ReceivedMessage {
    pub fn retry_count(&self) -> Option<u32> {
        match self.attributes.get(RETRY_COUNT_ATTRIBUTE) {
            Some(QueueAttribute::Number(value)) => value.parse().ok(),
            _ => None,
        }
    }

    pub fn original_queue_url(&self) -> Option<String> {
        match self.attributes.get(ORIGINAL_QUEUE_URL_ATTRIBUTE) {
            Some(QueueAttribute::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Queue transport seam: pointer-message publishing, consumer polling, and
/// DLQ redrive all go through this trait.
pub trait EventQueue {
    fn send(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &BTreeMap<String, QueueAttribute>,
    ) -> Result<(), QueueError>;

    fn receive(
        &self,
        queue_url: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError>;
}

pub struct SqsEventQueue {
    client: aws_sdk_sqs::Client,
}

impl SqsEventQueue {
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

impl EventQueue for SqsEventQueue {
    fn send(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &BTreeMap<String, QueueAttribute>,
    ) -> Result<(), QueueError> {
        let client = self.client.clone();
        let queue_url = queue_url.to_string();
        let body = body.to_string();

        let mut message_attributes = Vec::with_capacity(attributes.len());
        for (name, attribute) in attributes {
            let data_type = match attribute {
                QueueAttribute::Number(_) => "Number",
                QueueAttribute::Text(_) => "String",
            };
            let value = MessageAttributeValue::builder()
                .data_type(data_type)
                .string_value(attribute.value())
                .build()
                .map_err(|error| {
                    QueueError::Send(format!("invalid message attribute {name}: {error}"))
                })?;
            message_attributes.push((name.clone(), value));
        }

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut request = client.send_message().queue_url(queue_url).message_body(body);
                for (name, value) in message_attributes {
                    request = request.message_attributes(name, value);
                }

                request
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| QueueError::Send(error.to_string()))
            })
        })
    }

    fn receive(
        &self,
        queue_url: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let client = self.client.clone();
        let queue_url = queue_url.to_string();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .receive_message()
                    .queue_url(queue_url)
                    .max_number_of_messages(max_messages.min(10) as i32)
                    .message_attribute_names("All")
                    .send()
                    .await
                    .map_err(|error| QueueError::Receive(error.to_string()))
            })
        })?;

        let mut messages = Vec::new();
        for message in output.messages.unwrap_or_default() {
            let mut attributes = BTreeMap::new();
            for (name, value) in message.message_attributes.unwrap_or_default() {
                let Some(string_value) = value.string_value else {
                    continue;
                };
                let attribute = match value.data_type.as_str() {
                    "Number" => QueueAttribute::Number(string_value),
                    _ => QueueAttribute::Text(string_value),
                };
                attributes.insert(name, attribute);
            }

            messages.push(ReceivedMessage {
                message_id: message.message_id.unwrap_or_default(),
                receipt_handle: message.receipt_handle.unwrap_or_default(),
                body: message.body.unwrap_or_default(),
                attributes,
            });
        }

        Ok(messages)
    }

    fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        let client = self.client.clone();
        let queue_url = queue_url.to_string();
        let receipt_handle = receipt_handle.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_message()
                    .queue_url(queue_url)
                    .receipt_handle(receipt_handle)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| QueueError::Delete(error.to_string()))
            })
        })
    }
}
