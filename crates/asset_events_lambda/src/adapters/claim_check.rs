use asset_events_core::location::{event_object_key, EventLocation, InvalidLocation};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClaimCheckError {
    #[error(transparent)]
    InvalidLocation(#[from] InvalidLocation),

    #[error("event not found: {0}")]
    NotFound(String),

    #[error("invalid stored event payload: {0}")]
    Deserialize(String),

    #[error("event storage request failed: {0}")]
    Store(String),
}

/// Out-of-band storage for full event payloads; the queues carry only the
/// locator returned by `store`.
pub trait ClaimCheckStore {
    fn store(&self, event_kind: &str, payload: &Value) -> Result<EventLocation, ClaimCheckError>;

    fn read(&self, location: &str) -> Result<Value, ClaimCheckError>;
}

pub struct S3ClaimCheckStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ClaimCheckStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

impl ClaimCheckStore for S3ClaimCheckStore {
    fn store(&self, event_kind: &str, payload: &Value) -> Result<EventLocation, ClaimCheckError> {
        let key = event_object_key(event_kind, Utc::now(), &Uuid::new_v4().to_string());
        let location = EventLocation::new(self.bucket.clone(), key);

        let client = self.client.clone();
        let bucket = location.bucket.clone();
        let object_key = location.key.clone();
        let body = payload.to_string().into_bytes();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(ByteStream::from(body))
                    .content_type("application/json")
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        ClaimCheckError::Store(format!("failed to write event object: {error}"))
                    })
            })
        })?;

        Ok(location)
    }

    fn read(&self, location: &str) -> Result<Value, ClaimCheckError> {
        let parsed = EventLocation::parse(location)?;

        let client = self.client.clone();
        let bucket = parsed.bucket.clone();
        let object_key = parsed.key.clone();
        let location = location.to_string();

        let bytes = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map_err(|error| match &error {
                        SdkError::ServiceError(service)
                            if matches!(service.err(), GetObjectError::NoSuchKey(_)) =>
                        {
                            ClaimCheckError::NotFound(location.clone())
                        }
                        _ => ClaimCheckError::Store(format!(
                            "failed to read event object: {error}"
                        )),
                    })?;

                output.body.collect().await.map_err(|error| {
                    ClaimCheckError::Store(format!("failed to read event object body: {error}"))
                })
            })
        })?;

        serde_json::from_slice(&bytes.into_bytes()).map_err(|error| {
            ClaimCheckError::Deserialize(format!("stored event is not valid JSON: {error}"))
        })
    }
}
