use asset_events_lambda::adapters::asset_store::DynamoDbAssetStore;
use asset_events_lambda::adapters::claim_check::S3ClaimCheckStore;
use asset_events_lambda::adapters::queue::SqsEventQueue;
use asset_events_lambda::handlers::decision::handle_decision_batch;
use asset_events_lambda::publisher::QueuePublisher;
use asset_events_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
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

    let records = stream_records(&event.payload);
    let summary = handle_decision_batch(&records, &asset_store, &publisher);
    serde_json::to_value(summary)
        .map_err(|error| Error::from(format!("failed to serialize decision summary: {error}")))
}

fn stream_records(event: &Value) -> Vec<Value> {
    event
        .get("Records")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
