//! Deterministic domain behavior and wire contracts for the asset
//! change-event pipeline.
//!
//! This crate owns event parsing and validation, content fingerprinting,
//! upsert/drop/no-action decisions, claim-check locator handling, and the
//! dead-letter retry policy. It intentionally excludes AWS SDK and Lambda
//! runtime concerns, which live in `asset_events_lambda`.

pub mod asset;
pub mod contract;
pub mod decision;
pub mod event;
pub mod fingerprint;
pub mod location;
pub mod payload;
pub mod redrive;
pub mod stream;
