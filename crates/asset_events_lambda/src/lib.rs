//! AWS-oriented adapters and handlers for the asset change-event pipeline.
//!
//! This crate owns runtime integration details (Lambda entrypoints, the
//! DynamoDB, S3, and SQS adapters, and downstream delivery) layered over the
//! deterministic behavior in `asset_events_core`. Handlers are synchronous
//! and talk to the cloud through the trait seams in `adapters`.

pub mod adapters;
pub mod handlers;
pub mod publisher;
pub mod telemetry;
