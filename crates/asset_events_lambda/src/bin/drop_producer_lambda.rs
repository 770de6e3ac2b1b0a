use asset_events_core::contract::DEFAULT_MAX_MESSAGES;
use asset_events_lambda::adapters::claim_check::S3ClaimCheckStore;
use asset_events_lambda::adapters::forwarder::HttpEventForwarder;
use asset_events_lambda::adapters::queue::SqsEventQueue;
use asset_events_lambda::handlers::producer::{run_producer, ProducerKind};
use asset_events_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(_event: LambdaEvent<Value>) -> Result<Value, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let queue_url = std::env::var("DROP_QUEUE_URL")
        .map_err(|_| Error::from("DROP_QUEUE_URL must be configured"))?;
    let bucket = std::env::var("EVENTS_BUCKET_NAME")
        .map_err(|_| Error::from("EVENTS_BUCKET_NAME must be configured"))?;
    let endpoint = std::env::var("DOWNSTREAM_ENDPOINT")
        .map_err(|_| Error::from("DOWNSTREAM_ENDPOINT must be configured"))?;
    let max_messages = std::env::var("PRODUCER_MAX_MESSAGES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_MAX_MESSAGES);

    let queue = SqsEventQueue::new(aws_sdk_sqs::Client::new(&aws_config));
    let claim_check = S3ClaimCheckStore::new(aws_sdk_s3::Client::new(&aws_config), bucket);
    let forwarder =
        HttpEventForwarder::new(endpoint).map_err(|error| Error::from(error.to_string()))?;

    let summary = run_producer(
        &queue_url,
        max_messages,
        &queue,
        &claim_check,
        &forwarder,
        ProducerKind::Drop,
    );
    serde_json::to_value(summary)
        .map_err(|error| Error::from(format!("failed to serialize producer summary: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
