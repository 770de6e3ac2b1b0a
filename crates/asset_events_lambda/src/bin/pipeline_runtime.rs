//! Single-binary runtime that routes the incoming trigger to the right
//! handler: Kinesis stream batches go to the decision engine, SQS triggers
//! run the matching producer, anything else runs a redrive sweep.

use asset_events_core::contract::DEFAULT_MAX_MESSAGES;
use asset_events_lambda::adapters::asset_store::DynamoDbAssetStore;
use asset_events_lambda::adapters::claim_check::S3ClaimCheckStore;
use asset_events_lambda::adapters::forwarder::HttpEventForwarder;
use asset_events_lambda::adapters::queue::SqsEventQueue;
use asset_events_lambda::handlers::decision::handle_decision_batch;
use asset_events_lambda::handlers::producer::{run_producer, ProducerKind};
use asset_events_lambda::handlers::redrive::process_dead_letter_queues;
use asset_events_lambda::publisher::QueuePublisher;
use asset_events_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
    if is_stream_event(&event.payload) {
        return handle_stream_trigger(&event.payload).await;
    }
    if is_sqs_event(&event.payload) {
        return handle_queue_trigger(&event.payload).await;
    }
    handle_redrive_trigger(&event.payload).await
}

async fn handle_stream_trigger(payload: &Value) -> Result<Value, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let table_name = std::env::var("ASSETS_TABLE_NAME")
        .map_err(|_| Error::from("ASSETS_TABLE_NAME must be configured"))?;
    let bucket = std::env::var("EVENTS_BUCKET_NAME")
        .map_err(|_| Error::from("EVENTS_BUCKET_NAME must be configured"))?;
    let upsert_queue_url = std::env::var("UPSERT_QUEUE_URL")
        .map_err(|_| Error::from("UPSERT_QUEUE_URL must be configured"))?;
    let drop_queue_url = std::env::var("DROP_QUEUE_URL")
        .map_err(|_| Error::from("DROP_QUEUE_URL must be configured"))?;

    let asset_store =
        DynamoDbAssetStore::new(aws_sdk_dynamodb::Client::new(&aws_config), table_name);
    let claim_check = S3ClaimCheckStore::new(aws_sdk_s3::Client::new(&aws_config), bucket);
    let queue = SqsEventQueue::new(aws_sdk_sqs::Client::new(&aws_config));
    let publisher = QueuePublisher::new(upsert_queue_url, drop_queue_url, &claim_check, &queue);

    let records = event_records(payload);
    let summary = handle_decision_batch(&records, &asset_store, &publisher);
    serde_json::to_value(summary)
        .map_err(|error| Error::from(format!("failed to serialize decision summary: {error}")))
}

async fn handle_queue_trigger(payload: &Value) -> Result<Value, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let upsert_queue_url = std::env::var("UPSERT_QUEUE_URL")
        .map_err(|_| Error::from("UPSERT_QUEUE_URL must be configured"))?;
    let drop_queue_url = std::env::var("DROP_QUEUE_URL")
        .map_err(|_| Error::from("DROP_QUEUE_URL must be configured"))?;
    let bucket = std::env::var("EVENTS_BUCKET_NAME")
        .map_err(|_| Error::from("EVENTS_BUCKET_NAME must be configured"))?;
    let endpoint = std::env::var("DOWNSTREAM_ENDPOINT")
        .map_err(|_| Error::from("DOWNSTREAM_ENDPOINT must be configured"))?;
    let max_messages = std::env::var("PRODUCER_MAX_MESSAGES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_MAX_MESSAGES);

    let kind = producer_kind(payload, &drop_queue_url);
    let queue_url = match kind {
        ProducerKind::Upsert => &upsert_queue_url,
        ProducerKind::Drop => &drop_queue_url,
    };

    let queue = SqsEventQueue::new(aws_sdk_sqs::Client::new(&aws_config));
    let claim_check = S3ClaimCheckStore::new(aws_sdk_s3::Client::new(&aws_config), bucket);
    let forwarder =
        HttpEventForwarder::new(endpoint).map_err(|error| Error::from(error.to_string()))?;

    let summary = run_producer(
        queue_url,
        max_messages,
        &queue,
        &claim_check,
        &forwarder,
        kind,
    );
    serde_json::to_value(summary)
        .map_err(|error| Error::from(format!("failed to serialize producer summary: {error}")))
}

async fn handle_redrive_trigger(payload: &Value) -> Result<Value, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let configured =
        std::env::var("DLQ_URLS").map_err(|_| Error::from("DLQ_URLS must be configured"))?;

    let dlq_urls: Vec<String> = payload
        .get("dlq_urls")
        .and_then(Value::as_array)
        .map(|urls| {
            urls.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|| {
            configured
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect()
        });

    let queue = SqsEventQueue::new(aws_sdk_sqs::Client::new(&aws_config));
    let summary = process_dead_letter_queues(&dlq_urls, &queue);
    serde_json::to_value(summary)
        .map_err(|error| Error::from(format!("failed to serialize redrive summary: {error}")))
}

fn event_records(payload: &Value) -> Vec<Value> {
    payload
        .get("Records")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn is_stream_event(payload: &Value) -> bool {
    let records = event_records(payload);
    !records.is_empty() && records.iter().all(|record| record.get("kinesis").is_some())
}

fn is_sqs_event(payload: &Value) -> bool {
    let records = event_records(payload);
    !records.is_empty()
        && records
            .iter()
            .all(|record| record.get("eventSource").and_then(Value::as_str) == Some("aws:sqs"))
}

/// Picks the producer flavor by matching the trigger's source ARN against
/// the drop queue name; everything else is treated as the upsert queue.
fn producer_kind(payload: &Value, drop_queue_url: &str) -> ProducerKind {
    let drop_queue_name = drop_queue_url.rsplit('/').next().unwrap_or_default();
    let from_drop_queue = event_records(payload).iter().any(|record| {
        record
            .get("eventSourceARN")
            .and_then(Value::as_str)
            .is_some_and(|arn| arn.ends_with(drop_queue_name))
    });
    if from_drop_queue && !drop_queue_name.is_empty() {
        ProducerKind::Drop
    } else {
        ProducerKind::Upsert
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
