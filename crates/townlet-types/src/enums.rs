//! Enumeration types for the Townlet simulation.
//!
//! Wire values match the persisted catalog: place tags and item types
//! are stored SCREAMING, statuses and attributes lowercase, event types
//! in the `NPC_*` form the store's event table uses.

use serde::{Deserialize, Serialize};

/// Coarse mood/health status of an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcStatus {
    /// Default state: awake and unoccupied.
    Peaceful,
    /// Asleep; set by the sleep action.
    Sleeping,
    /// Engaged in work.
    Working,
    /// Low on one or more vital attributes.
    Unwell,
    /// Critically low on vital attributes.
    Awful,
}

impl Default for NpcStatus {
    fn default() -> Self {
        Self::Peaceful
    }
}

/// Capability tag on a place. Tags gate which actions are legal there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceTag {
    /// Items can be bought and sold here.
    Shop,
    /// Sleeping here grants a recovery bonus.
    House,
    /// Leisure venue.
    Entertainment,
    /// Work shifts can be performed here.
    Workable,
}

/// Kind of an item in the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// Can be eaten; applies its effects on consumption.
    Consumable,
    /// Wearable or usable gear.
    Equipment,
    /// Currency denominations.
    Monetary,
    /// Everything else.
    Misc,
}

impl Default for ItemType {
    fn default() -> Self {
        Self::Misc
    }
}

/// The NPC attribute an effect mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectAttribute {
    /// Satiety, 0 (starving) to 100 (full).
    Hunger,
    /// Stamina, 0 to 100.
    Energy,
    /// Morale, 0 to 100.
    Mood,
}

/// The closed set of event tags the bus routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// An action intent awaiting resolution; consumed by the executor.
    #[serde(rename = "NPC_ACTION")]
    NpcAction,
    /// The per-tick decision prompt; consumed by every NPC callback.
    #[serde(rename = "NPC_DECISION")]
    NpcDecision,
}
