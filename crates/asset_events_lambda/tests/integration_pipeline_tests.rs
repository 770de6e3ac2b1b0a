//! End-to-end pipeline tests over in-memory adapters: stream batch through
//! the decision engine to a pointer message, pointer message through the
//! producer to a forwarded payload, and a DLQ sweep back to the origin queue.

use std::collections::BTreeMap;
use std::sync::Mutex;

use asset_events_core::asset::Asset;
use asset_events_core::contract::PointerMessage;
use asset_events_core::event::Event;
use asset_events_core::location::{event_object_key, EventLocation};
use asset_events_lambda::adapters::asset_store::{AssetStore, AssetStoreError};
use asset_events_lambda::adapters::claim_check::{ClaimCheckError, ClaimCheckStore};
use asset_events_lambda::adapters::forwarder::{EventForwarder, ForwardError};
use asset_events_lambda::adapters::queue::{
    EventQueue, QueueAttribute, QueueError, ReceivedMessage, ORIGINAL_QUEUE_URL_ATTRIBUTE,
    RETRY_COUNT_ATTRIBUTE,
};
use asset_events_lambda::handlers::decision::handle_decision_batch;
use asset_events_lambda::handlers::producer::{run_producer, ProducerKind};
use asset_events_lambda::handlers::redrive::process_dead_letter_queues;
use asset_events_lambda::publisher::QueuePublisher;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

const UPSERT_QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/111/asset-upsert-queue";
const DROP_QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/111/asset-drop-queue";

struct InMemoryAssetStore {
    assets: Mutex<BTreeMap<(String, String), Asset>>,
}

impl InMemoryAssetStore {
    fn new() -> Self {
        Self {
            assets: Mutex::new(BTreeMap::new()),
        }
    }

    fn insert(&self, asset: Asset) {
        self.assets
            .lock()
            .expect("poisoned mutex")
            .insert((asset.partition_key(), asset.sort_key().to_string()), asset);
    }
}

impl AssetStore for InMemoryAssetStore {
    fn find_by_key(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<Asset>, AssetStoreError> {
        Ok(self
            .assets
            .lock()
            .expect("poisoned mutex")
            .get(&(partition_key.to_string(), sort_key.to_string()))
            .cloned())
    }

    fn find_by_parent_path(
        &self,
        parent_path: &str,
        account_number: &str,
        excluding_correlation_id: &str,
    ) -> Result<Vec<Asset>, AssetStoreError> {
        Ok(self
            .assets
            .lock()
            .expect("poisoned mutex")
            .values()
            .filter(|asset| {
                asset.parent_path() == parent_path
                    && asset.aws_account_number == account_number
                    && asset.correlation_id != excluding_correlation_id
            })
            .cloned()
            .collect())
    }

    fn save(&self, asset: &Asset) -> Result<(), AssetStoreError> {
        self.insert(asset.clone());
        Ok(())
    }
}

struct InMemoryClaimCheck {
    bucket: String,
    objects: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryClaimCheck {
    fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }
}

impl ClaimCheckStore for InMemoryClaimCheck {
    fn store(&self, event_kind: &str, payload: &Value) -> Result<EventLocation, ClaimCheckError> {
        let key = event_object_key(event_kind, Utc::now(), &Uuid::new_v4().to_string());
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.clone(), payload.clone());
        Ok(EventLocation::new(&self.bucket, key))
    }

    fn read(&self, location: &str) -> Result<Value, ClaimCheckError> {
        let parsed = EventLocation::parse(location)?;
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&parsed.key)
            .cloned()
            .ok_or_else(|| ClaimCheckError::NotFound(location.to_string()))
    }
}

struct InMemoryQueue {
    queues: Mutex<BTreeMap<String, Vec<ReceivedMessage>>>,
}

impl InMemoryQueue {
    fn new() -> Self {
        Self {
            queues: Mutex::new(BTreeMap::new()),
        }
    }

    fn enqueue(&self, queue_url: &str, body: String, attributes: BTreeMap<String, QueueAttribute>) {
        let id = Uuid::new_v4().to_string();
        self.queues
            .lock()
            .expect("poisoned mutex")
            .entry(queue_url.to_string())
            .or_default()
            .push(ReceivedMessage {
                message_id: id.clone(),
                receipt_handle: id,
                body,
                attributes,
            });
    }

    fn messages(&self, queue_url: &str) -> Vec<ReceivedMessage> {
        self.queues
            .lock()
            .expect("poisoned mutex")
            .get(queue_url)
            .cloned()
            .unwrap_or_default()
    }
}

impl EventQueue for InMemoryQueue {
    fn send(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &BTreeMap<String, QueueAttribute>,
    ) -> Result<(), QueueError> {
        self.enqueue(queue_url, body.to_string(), attributes.clone());
        Ok(())
    }

    fn receive(
        &self,
        queue_url: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        Ok(self
            .messages(queue_url)
            .into_iter()
            .take(max_messages)
            .collect())
    }

    fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueError> {
        if let Some(messages) = self
            .queues
            .lock()
            .expect("poisoned mutex")
            .get_mut(queue_url)
        {
            messages.retain(|message| message.receipt_handle != receipt_handle);
        }
        Ok(())
    }
}

struct CollectingForwarder {
    forwarded: Mutex<Vec<Value>>,
}

impl CollectingForwarder {
    fn new() -> Self {
        Self {
            forwarded: Mutex::new(Vec::new()),
        }
    }

    fn forwarded_events(&self) -> Vec<Value> {
        self.forwarded.lock().expect("poisoned mutex").clone()
    }
}

impl EventForwarder for CollectingForwarder {
    fn forward(&self, event: &Value) -> Result<(), ForwardError> {
        self.forwarded
            .lock()
            .expect("poisoned mutex")
            .push(event.clone());
        Ok(())
    }
}

fn stream_record(event_type: &str, event_id: &str, data: Value) -> Value {
    let payload = json!({
        "event_type": event_type,
        "event_id": event_id,
        "timestamp": "2026-03-01T12:00:00Z",
        "data": data,
    });
    let encoded = base64::engine::general_purpose::STANDARD.encode(payload.to_string());
    json!({"kinesis": {"data": encoded}})
}

fn event_data(name: &str, correlation_id: &str, metadata: Value) -> Value {
    json!({
        "technology_name": "svc",
        "instance_technology_name": "i1",
        "asset_parent_name": "p1",
        "asset_name": name,
        "aws_account_number": "111",
        "status": "active",
        "correlation_id": correlation_id,
        "metadata": metadata,
    })
}

fn stored_asset(name: &str, correlation_id: &str) -> Asset {
    let event = Event::from_value(&event_data(name, correlation_id, json!({"k": "v"})))
        .expect("event should build");
    Asset::create_from_event(&event, "hash-1", Utc::now())
}

#[test]
fn stream_batch_persists_asset_and_publishes_pointer() {
    let asset_store = InMemoryAssetStore::new();
    let claim_check = InMemoryClaimCheck::new("events-bucket");
    let queue = InMemoryQueue::new();
    let publisher = QueuePublisher::new(UPSERT_QUEUE, DROP_QUEUE, &claim_check, &queue);

    let records = vec![stream_record(
        "UPSERT",
        "evt-1",
        event_data("a1", "corr-1", json!({"k": "v"})),
    )];
    let summary = handle_decision_batch(&records, &asset_store, &publisher);

    assert_eq!(summary.received, 1);
    assert_eq!(summary.decided, 1);
    assert_eq!(summary.published, 1);
    assert!(summary.errors.is_empty());

    let saved = asset_store
        .find_by_key("svc/i1/p1/a1", "111")
        .expect("lookup should pass")
        .expect("asset should be persisted");
    assert_eq!(saved.correlation_id, "corr-1");

    let messages = queue.messages(UPSERT_QUEUE);
    assert_eq!(messages.len(), 1);
    let pointer: PointerMessage =
        serde_json::from_str(&messages[0].body).expect("pointer should parse");
    assert_eq!(serde_json::to_value(&pointer.event_type).unwrap(), "UPSERT");

    // The locator resolves to the stored envelope: blob write preceded the send.
    let payload = claim_check
        .read(&pointer.event_location)
        .expect("locator should resolve");
    assert_eq!(payload["event_type"], "upsert");
    assert_eq!(payload["asset"]["asset_name"], "a1");
}

#[test]
fn identical_resubmission_publishes_nothing_new() {
    let asset_store = InMemoryAssetStore::new();
    let claim_check = InMemoryClaimCheck::new("events-bucket");
    let queue = InMemoryQueue::new();
    let publisher = QueuePublisher::new(UPSERT_QUEUE, DROP_QUEUE, &claim_check, &queue);

    let records = vec![stream_record(
        "UPSERT",
        "evt-1",
        event_data("a1", "corr-1", json!({"k": "v"})),
    )];
    handle_decision_batch(&records, &asset_store, &publisher);
    let summary = handle_decision_batch(&records, &asset_store, &publisher);

    assert_eq!(summary.decided, 1);
    assert_eq!(summary.published, 0);
    assert_eq!(queue.messages(UPSERT_QUEUE).len(), 1);
}

#[test]
fn metadata_change_republishes_with_new_hash() {
    let asset_store = InMemoryAssetStore::new();
    let claim_check = InMemoryClaimCheck::new("events-bucket");
    let queue = InMemoryQueue::new();
    let publisher = QueuePublisher::new(UPSERT_QUEUE, DROP_QUEUE, &claim_check, &queue);

    let first = vec![stream_record(
        "UPSERT",
        "evt-1",
        event_data("a1", "corr-1", json!({"k": "v"})),
    )];
    handle_decision_batch(&first, &asset_store, &publisher);
    let original_hash = asset_store
        .find_by_key("svc/i1/p1/a1", "111")
        .expect("lookup should pass")
        .expect("asset should exist")
        .hash_value;

    let second = vec![stream_record(
        "UPSERT",
        "evt-2",
        event_data("a1", "corr-2", json!({"k": "v2"})),
    )];
    let summary = handle_decision_batch(&second, &asset_store, &publisher);

    assert_eq!(summary.published, 1);
    assert_eq!(queue.messages(UPSERT_QUEUE).len(), 2);
    let updated = asset_store
        .find_by_key("svc/i1/p1/a1", "111")
        .expect("lookup should pass")
        .expect("asset should exist");
    assert_ne!(updated.hash_value, original_hash);
    assert_eq!(updated.correlation_id, "corr-2");
}

#[test]
fn drop_record_batches_unaffected_siblings_into_one_pointer() {
    let asset_store = InMemoryAssetStore::new();
    asset_store.insert(stored_asset("sibling-1", "corr-old"));
    asset_store.insert(stored_asset("sibling-2", "corr-old"));
    asset_store.insert(stored_asset("survivor", "corr-drop"));

    let claim_check = InMemoryClaimCheck::new("events-bucket");
    let queue = InMemoryQueue::new();
    let publisher = QueuePublisher::new(UPSERT_QUEUE, DROP_QUEUE, &claim_check, &queue);

    let records = vec![stream_record(
        "DROP",
        "evt-9",
        event_data("gone", "corr-drop", json!({})),
    )];
    let summary = handle_decision_batch(&records, &asset_store, &publisher);

    assert_eq!(summary.published, 1);
    let messages = queue.messages(DROP_QUEUE);
    assert_eq!(messages.len(), 1);

    let pointer: PointerMessage =
        serde_json::from_str(&messages[0].body).expect("pointer should parse");
    let payload = claim_check
        .read(&pointer.event_location)
        .expect("locator should resolve");
    let assets = payload["assets"].as_array().expect("batch envelope");
    assert_eq!(assets.len(), 2);
}

#[test]
fn producer_resolves_pointer_forwards_payload_and_drains_queue() {
    let claim_check = InMemoryClaimCheck::new("events-bucket");
    let queue = InMemoryQueue::new();
    let forwarder = CollectingForwarder::new();

    let payload = json!({
        "event_type": "upsert",
        "asset": {
            "correlation_id": "corr-1",
            "status": "active",
            "asset_name": "a1",
            "asset_parent_name": "p1",
            "asset_counts": "3",
            "aws_account_number": "111",
            "technology_service_name": "svc",
            "asset_type": "table",
            "instance_technology_name": "i1",
        },
    });
    let location = claim_check
        .store("upsert", &payload)
        .expect("store should pass");
    queue.enqueue(
        UPSERT_QUEUE,
        json!({"event_type": "UPSERT", "event_location": location.to_string()}).to_string(),
        BTreeMap::new(),
    );

    let summary = run_producer(
        UPSERT_QUEUE,
        10,
        &queue,
        &claim_check,
        &forwarder,
        ProducerKind::Upsert,
    );

    assert_eq!(summary.processed, 1);
    assert!(summary.errors.is_empty());
    let forwarded = forwarder.forwarded_events();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0]["asset_name"], "a1");
    assert!(queue.messages(UPSERT_QUEUE).is_empty());
}

#[test]
fn producer_leaves_unresolvable_pointer_for_redelivery() {
    let claim_check = InMemoryClaimCheck::new("events-bucket");
    let queue = InMemoryQueue::new();
    let forwarder = CollectingForwarder::new();

    queue.enqueue(
        UPSERT_QUEUE,
        json!({
            "event_type": "UPSERT",
            "event_location": "s3://events-bucket/events/upsert/missing.json",
        })
        .to_string(),
        BTreeMap::new(),
    );

    let summary = run_producer(
        UPSERT_QUEUE,
        10,
        &queue,
        &claim_check,
        &forwarder,
        ProducerKind::Upsert,
    );

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.errors.len(), 1);
    assert!(forwarder.forwarded_events().is_empty());
    assert_eq!(queue.messages(UPSERT_QUEUE).len(), 1);
}

#[test]
fn redrive_moves_message_back_to_origin_queue() {
    let queue = InMemoryQueue::new();
    let dlq_url = format!("{UPSERT_QUEUE}-dlq");
    let mut attributes = BTreeMap::new();
    attributes.insert(
        RETRY_COUNT_ATTRIBUTE.to_string(),
        QueueAttribute::Number("2".to_string()),
    );
    queue.enqueue(
        &dlq_url,
        json!({"event_type": "UPSERT", "event_location": "s3://b/k"}).to_string(),
        attributes,
    );

    let summary = process_dead_letter_queues(&[dlq_url.clone()], &queue);

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.discarded, 0);
    assert!(queue.messages(&dlq_url).is_empty());

    let redriven = queue.messages(UPSERT_QUEUE);
    assert_eq!(redriven.len(), 1);
    assert_eq!(redriven[0].retry_count(), Some(3));
    assert_eq!(
        redriven[0].original_queue_url().as_deref(),
        Some(UPSERT_QUEUE)
    );
}

#[test]
fn redrive_discards_exhausted_message_without_republish() {
    let queue = InMemoryQueue::new();
    let dlq_url = format!("{UPSERT_QUEUE}-dlq");
    let mut attributes = BTreeMap::new();
    attributes.insert(
        RETRY_COUNT_ATTRIBUTE.to_string(),
        QueueAttribute::Number("5".to_string()),
    );
    queue.enqueue(
        &dlq_url,
        json!({"event_type": "UPSERT", "event_location": "s3://b/k"}).to_string(),
        attributes,
    );

    let summary = process_dead_letter_queues(&[dlq_url.clone()], &queue);

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.discarded, 1);
    assert!(queue.messages(&dlq_url).is_empty());
    assert!(queue.messages(UPSERT_QUEUE).is_empty());
}

#[test]
fn redrive_attaches_origin_attribute_used_on_the_next_failure() {
    // A message redriven once carries original_queue_url; if it dead-letters
    // again the explicit attribute wins over the suffix fallback.
    let queue = InMemoryQueue::new();
    let dlq_url = format!("{DROP_QUEUE}-dlq");
    let mut attributes = BTreeMap::new();
    attributes.insert(
        RETRY_COUNT_ATTRIBUTE.to_string(),
        QueueAttribute::Number("1".to_string()),
    );
    attributes.insert(
        ORIGINAL_QUEUE_URL_ATTRIBUTE.to_string(),
        QueueAttribute::Text(UPSERT_QUEUE.to_string()),
    );
    queue.enqueue(&dlq_url, json!({"retry": true}).to_string(), attributes);

    process_dead_letter_queues(&[dlq_url], &queue);

    assert_eq!(queue.messages(UPSERT_QUEUE).len(), 1);
    assert!(queue.messages(DROP_QUEUE).is_empty());
}
