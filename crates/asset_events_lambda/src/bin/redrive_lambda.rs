use asset_events_lambda::adapters::queue::SqsEventQueue;
use asset_events_lambda::handlers::redrive::process_dead_letter_queues;
use asset_events_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let configured =
        std::env::var("DLQ_URLS").map_err(|_| Error::from("DLQ_URLS must be configured"))?;

    let dlq_urls = resolve_dlq_urls(&event.payload, &configured);
    let queue = SqsEventQueue::new(aws_sdk_sqs::Client::new(&aws_config));

    let summary = process_dead_letter_queues(&dlq_urls, &queue);
    serde_json::to_value(summary)
        .map_err(|error| Error::from(format!("failed to serialize redrive summary: {error}")))
}

/// The scheduled-event payload may carry a `dlq_urls` list overriding the
/// configured queues.
fn resolve_dlq_urls(event: &Value, configured: &str) -> Vec<String> {
    event
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
        })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
