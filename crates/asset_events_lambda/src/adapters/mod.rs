pub mod asset_store;
pub mod claim_check;
pub mod forwarder;
pub mod queue;
