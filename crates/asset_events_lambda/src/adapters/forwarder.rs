use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to deliver event downstream: {0}")]
    Send(String),

    #[error("downstream endpoint rejected event: {status} - {body}")]
    Rejected { status: u16, body: String },
}

/// Delivery target for denormalized upsert/drop events. The transport behind
/// the seam is a composition-time choice.
pub trait EventForwarder {
    fn forward(&self, event: &Value) -> Result<(), ForwardError>;
}

pub struct HttpEventForwarder {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpEventForwarder {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|error| ForwardError::Send(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl EventForwarder for HttpEventForwarder {
    fn forward(&self, event: &Value) -> Result<(), ForwardError> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let event = event.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client
                    .post(&endpoint)
                    .json(&event)
                    .send()
                    .await
                    .map_err(|error| ForwardError::Send(error.to_string()))?;

                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(ForwardError::Rejected { status, body });
                }

                Ok(())
            })
        })
    }
}
