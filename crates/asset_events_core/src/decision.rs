use chrono::{DateTime, Utc};

use crate::asset::Asset;
use crate::contract::EventAction;
use crate::event::Event;
use crate::fingerprint::event_fingerprint;

/// Outcome of comparing an inbound event to the asset's stored state.
/// Carries the asset the caller is expected to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDecision {
    pub action: EventAction,
    pub asset: Asset,
}

impl EventDecision {
    pub fn upsert(asset: Asset) -> Self {
        Self {
            action: EventAction::Upsert,
            asset,
        }
    }

    pub fn drop(asset: Asset) -> Self {
        Self {
            action: EventAction::Drop,
            asset,
        }
    }

    pub fn no_action(asset: Asset) -> Self {
        Self {
            action: EventAction::NoAction,
            asset,
        }
    }

    /// Even NO_ACTION bumps `updated_at`, so the asset is always persisted.
    pub fn should_save_asset(&self) -> bool {
        true
    }

    pub fn should_produce_event(&self) -> bool {
        self.is_upsert() || self.is_drop()
    }

    pub fn is_upsert(&self) -> bool {
        self.action == EventAction::Upsert
    }

    pub fn is_drop(&self) -> bool {
        self.action == EventAction::Drop
    }

    pub fn is_no_action(&self) -> bool {
        self.action == EventAction::NoAction
    }
}

/// Decides what to do with an inbound event given the asset's current stored
/// state. `now` is supplied by the caller so the decision stays deterministic.
pub fn decide_event_action(
    event: &Event,
    existing_asset: Option<Asset>,
    now: DateTime<Utc>,
) -> EventDecision {
    let event_hash = event_fingerprint(event);

    match existing_asset {
        None => EventDecision::upsert(Asset::create_from_event(event, &event_hash, now)),
        Some(mut asset) => {
            if asset.has_changed(&event_hash) {
                asset.update_from_event(event, &event_hash, now);
                EventDecision::upsert(asset)
            } else {
                asset.updated_at = now;
                EventDecision::no_action(asset)
            }
        }
    }
}
